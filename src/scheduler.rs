//! Realization Scheduler
//!
//! Drives every station once per tick: time first, then the dial. Dial
//! updates are skipped while the dial is unchanged unless the generator
//! hardware state is unknown, in which case every station rewrites its
//! generators in full.

use crate::station::{Station, StationContext};
use crate::types::{DialFrequency, Millis};

/// Per-tick station driver
#[derive(Debug)]
pub struct RealizationScheduler {
    hardware_unknown: bool,
    last_dial: Option<DialFrequency>,
}

impl Default for RealizationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RealizationScheduler {
    /// Scheduler that starts with a full generator re-sync
    #[must_use]
    pub const fn new() -> Self {
        Self {
            hardware_unknown: true,
            last_dial: None,
        }
    }

    /// The generators may have lost their state (reset, bus glitch)
    pub fn mark_hardware_unknown(&mut self) {
        self.hardware_unknown = true;
    }

    /// A full re-sync is pending
    #[must_use]
    pub const fn is_hardware_unknown(&self) -> bool {
        self.hardware_unknown
    }

    /// Advance every station to `now`; false if a station asked to stop
    pub fn step(&mut self, stations: &mut [Station], ctx: &mut StationContext<'_>, now: Millis) -> bool {
        stations.iter_mut().all(|station| station.step(ctx, now))
    }

    /// Push `dial` to every station, re-syncing hardware if needed
    pub fn update(&mut self, stations: &mut [Station], ctx: &mut StationContext<'_>, dial: DialFrequency) {
        for station in stations.iter_mut() {
            station.update(ctx, dial);
        }
        if self.hardware_unknown {
            info!("generator re-sync");
            for station in stations.iter_mut() {
                station.force_refresh(ctx.pool);
            }
            ctx.pool.force_refresh_idle();
            self.hardware_unknown = false;
        }
        self.last_dial = Some(dial);
    }

    /// One scheduler pass: step, then update if the dial moved or a
    /// re-sync is pending
    pub fn tick(
        &mut self,
        stations: &mut [Station],
        ctx: &mut StationContext<'_>,
        now: Millis,
        dial: DialFrequency,
    ) -> bool {
        let running = self.step(stations, ctx, now);
        if self.hardware_unknown || self.last_dial != Some(dial) {
            self.update(stations, ctx, dial);
        }
        running
    }
}
