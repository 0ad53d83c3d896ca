//! Station Manager
//!
//! Decides which stations deserve the scarce generators. Every update it:
//!
//! 1. tracks the dial to learn the tuning direction and, when the listener
//!    has moved far enough, relocates distant stations ahead of the dial
//!    ("pipelining");
//! 2. moves stations between [`Lifecycle::Dormant`] and
//!    [`Lifecycle::Active`] by distance;
//! 3. hands out generator slots, keeping existing assignments stable and
//!    filling the rest in table order.
//!
//! The lookahead is asymmetric while tuning: stations behind the direction
//! of travel go dormant at half the distance of those ahead.

use crate::config::{pipeline, PipelineConfig, GENERATOR_COUNT, MAX_STATIONS};
use crate::generator::GeneratorPool;
use crate::station::{Station, StationContext};
use crate::types::{DialFrequency, Lifecycle, Millis, StationId, TuningDirection};
use heapless::Vec;

/// Distance from `station` to the dial (Hz)
fn distance(station: &Station, dial: DialFrequency) -> f64 {
    let d = station.target_hz() - dial.as_f64();
    if d < 0.0 {
        -d
    } else {
        d
    }
}

/// Lifecycle and generator-slot manager
#[derive(Debug, Default)]
pub struct StationManager {
    assignments: Vec<StationId, GENERATOR_COUNT>,
    pipelining: bool,
    last_dial: Option<u32>,
    center: Option<u32>,
    direction: TuningDirection,
    last_tuning: Option<Millis>,
    last_relocation: Option<Millis>,
}

impl StationManager {
    /// Manager with pipelining disabled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable dial-following relocation
    pub fn set_pipelining(&mut self, enabled: bool) {
        self.pipelining = enabled;
        self.direction = TuningDirection::Stopped;
        self.last_tuning = None;
        self.last_relocation = None;
        self.center = self.last_dial;
    }

    /// Pipelining enabled
    #[must_use]
    pub const fn is_pipelining(&self) -> bool {
        self.pipelining
    }

    /// Direction the dial was last seen moving
    #[must_use]
    pub const fn tuning_direction(&self) -> TuningDirection {
        self.direction
    }

    /// Dial position at the last relocation pass (Hz)
    #[must_use]
    pub const fn center_hz(&self) -> Option<u32> {
        self.center
    }

    /// Station holding each assigned slot; a dual station appears twice
    #[must_use]
    pub fn assignments(&self) -> &[StationId] {
        &self.assignments
    }

    /// Stations taking part in management
    #[must_use]
    pub fn in_service_count(&self, stations: &[Station]) -> usize {
        stations.iter().filter(|s| s.is_in_service()).count()
    }

    /// Put every station in service and run a first update
    pub fn setup(&mut self, stations: &mut [Station], ctx: &mut StationContext<'_>, dial: DialFrequency, now: Millis) {
        for station in stations.iter_mut() {
            station.set_in_service(true);
            station.set_lifecycle(Lifecycle::Active, ctx.pool);
        }
        self.last_dial = Some(dial.hz());
        self.center = Some(dial.hz());
        self.last_tuning = Some(now);
        info!("managing {} stations at {}", stations.len(), dial);
        self.update_stations(stations, ctx, dial, now);
    }

    /// Track the dial, refresh lifecycles and reallocate slots
    pub fn update_stations(
        &mut self,
        stations: &mut [Station],
        ctx: &mut StationContext<'_>,
        dial: DialFrequency,
        now: Millis,
    ) {
        let config = ctx.config.pipeline;
        if self.pipelining {
            self.track_tuning(stations, ctx.pool, &config, dial, now);
        }
        self.update_lifecycles(stations, ctx.pool, &config, dial);
        self.allocate(stations, ctx, now);
    }

    fn track_tuning(
        &mut self,
        stations: &mut [Station],
        pool: &mut GeneratorPool,
        config: &PipelineConfig,
        dial: DialFrequency,
        now: Millis,
    ) {
        let hz = dial.hz();
        let Some(last) = self.last_dial else {
            self.last_dial = Some(hz);
            self.center = Some(hz);
            return;
        };

        let change = i64::from(hz) - i64::from(last);
        if change.unsigned_abs() >= u64::from(config.tune_threshold_hz) {
            let direction = TuningDirection::from_change(change);
            if direction != self.direction {
                debug!("tuning {}", direction);
            }
            self.direction = direction;
            self.last_tuning = Some(now);
            self.last_dial = Some(hz);
        } else if self
            .last_tuning
            .map_or(true, |t| now.since(t) >= config.settle_timeout_ms)
            && self.direction != TuningDirection::Stopped
        {
            debug!("tuning stopped");
            self.direction = TuningDirection::Stopped;
        }

        let center = self.center.unwrap_or(hz);
        let shift = (i64::from(hz) - i64::from(center)).unsigned_abs();
        let interval_elapsed = self
            .last_relocation
            .map_or(true, |t| now.since(t) > config.relocation_interval_ms);
        let moving = self.direction != TuningDirection::Stopped;
        if moving && shift >= u64::from(config.relocation_threshold_hz) && interval_elapsed {
            self.relocate(stations, pool, config, dial);
            self.center = Some(hz);
            self.last_relocation = Some(now);
        }
    }

    /// A station far enough away that moving it will not be noticed
    #[must_use]
    pub fn can_interrupt(&self, station: &Station, dial: DialFrequency, config: &PipelineConfig) -> bool {
        let audible = f64::from(config.audible_range_hz);
        let d = distance(station, dial);
        match station.lifecycle() {
            Lifecycle::Dormant | Lifecycle::Silent => true,
            Lifecycle::Active => d > 2.0 * audible,
            Lifecycle::Audible => d > audible,
        }
    }

    /// Lookahead for `station`, halved behind the direction of travel
    #[must_use]
    pub fn effective_lookahead(&self, station: &Station, dial: DialFrequency, config: &PipelineConfig) -> f64 {
        let lookahead = f64::from(config.lookahead_range_hz);
        let ahead = match self.direction {
            TuningDirection::Stopped => true,
            TuningDirection::Up => station.target_hz() >= dial.as_f64(),
            TuningDirection::Down => station.target_hz() <= dial.as_f64(),
        };
        if ahead {
            lookahead
        } else {
            lookahead / 2.0
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn relocate(
        &mut self,
        stations: &mut [Station],
        pool: &mut GeneratorPool,
        config: &PipelineConfig,
        dial: DialFrequency,
    ) {
        let lookahead = f64::from(config.lookahead_range_hz);
        let mut candidates: Vec<(f64, usize), MAX_STATIONS> = Vec::new();
        for (i, station) in stations.iter().enumerate() {
            if !station.is_in_service() {
                continue;
            }
            let d = distance(station, dial);
            if d > lookahead && self.can_interrupt(station, dial, config) && candidates.push((d, i)).is_err() {
                break;
            }
        }
        candidates.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));
        debug!("relocating around {} ({} candidates)", dial, candidates.len());

        let limit = self.in_service_count(stations).saturating_sub(1);
        for (k, &(_, i)) in candidates.iter().take(limit).enumerate() {
            let k = k as u32;
            let target = match self.direction {
                TuningDirection::Up => dial
                    .hz()
                    .saturating_add(pipeline::AHEAD_OFFSET_HZ + k * pipeline::AHEAD_SPACING_HZ),
                TuningDirection::Down => dial
                    .hz()
                    .saturating_sub(pipeline::BEHIND_OFFSET_HZ + k * pipeline::BEHIND_SPACING_HZ)
                    .max(config.min_relocated_hz),
                TuningDirection::Stopped => return,
            };
            let station = &mut stations[i];
            debug!("relocate {} to {} Hz", station.id(), target);
            station.reinitialize(pool, f64::from(target));
            station.randomize();
        }
    }

    fn update_lifecycles(
        &self,
        stations: &mut [Station],
        pool: &mut GeneratorPool,
        config: &PipelineConfig,
        dial: DialFrequency,
    ) {
        let audible = f64::from(config.audible_range_hz);
        for station in stations.iter_mut().filter(|s| s.is_in_service()) {
            let d = distance(station, dial);
            if d > audible && d > self.effective_lookahead(station, dial, config) {
                station.set_lifecycle(Lifecycle::Dormant, pool);
            } else if station.lifecycle() == Lifecycle::Dormant {
                station.set_lifecycle(Lifecycle::Active, pool);
            }
        }
    }

    fn allocate(&mut self, stations: &mut [Station], ctx: &mut StationContext<'_>, now: Millis) {
        let capacity = ctx.pool.total_count().min(GENERATOR_COUNT);
        self.assignments.clear();

        // Existing assignments first so a playing station is never cut off
        for station in stations.iter_mut() {
            if !station.is_in_service() || station.lifecycle() != Lifecycle::Audible {
                continue;
            }
            let needed = station.generators_needed();
            if self.assignments.len() + needed <= capacity {
                self.assign(station.id(), needed);
            } else {
                station.set_lifecycle(Lifecycle::Silent, ctx.pool);
            }
        }

        // Remaining slots go to waiting stations in table order
        for station in stations.iter_mut() {
            if !station.is_in_service() || !station.lifecycle().wants_slot() {
                continue;
            }
            let needed = station.generators_needed();
            if self.assignments.len() + needed > capacity {
                if station.lifecycle() == Lifecycle::Active {
                    station.set_lifecycle(Lifecycle::Silent, ctx.pool);
                }
                continue;
            }
            station.set_lifecycle(Lifecycle::Audible, ctx.pool);
            match station.begin(ctx, now) {
                Ok(()) => self.assign(station.id(), needed),
                Err(e) => {
                    debug!("{} not started: {}", station.id(), e);
                    station.set_lifecycle(Lifecycle::Silent, ctx.pool);
                }
            }
        }
    }

    fn assign(&mut self, id: StationId, slots: usize) {
        for _ in 0..slots {
            let _ = self.assignments.push(id);
        }
    }
}
