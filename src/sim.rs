//! Band Simulation
//!
//! [`SimRadio`] owns the station table, the generator pool, the manager and
//! the scheduler, and is what the firmware main loop talks to:
//!
//! ```text
//! loop {
//!     radio.tick(now, dial, &mut meter);
//!     radio.drain_commands(|slot, cmd| chips[slot].apply(cmd));
//! }
//! ```

use crate::config::{SimConfig, MAX_STATIONS};
use crate::generator::{GeneratorCommand, GeneratorPool};
use crate::manager::StationManager;
use crate::meter::SignalMeter;
use crate::scheduler::RealizationScheduler;
use crate::station::{Station, StationContext};
use crate::types::{DialFrequency, Millis, SimError, StationId};
use heapless::Vec;

/// Simulated band
#[derive(Debug)]
pub struct SimRadio {
    config: SimConfig,
    pool: GeneratorPool,
    stations: Vec<Station, MAX_STATIONS>,
    manager: StationManager,
    scheduler: RealizationScheduler,
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

impl SimRadio {
    /// Empty band with a full generator pool
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            pool: GeneratorPool::default(),
            stations: Vec::new(),
            manager: StationManager::new(),
            scheduler: RealizationScheduler::new(),
        }
    }

    /// Add a station to the table
    ///
    /// # Errors
    ///
    /// [`SimError::StationTableFull`] if the table already holds
    /// [`MAX_STATIONS`] stations.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_station(&mut self, mut station: Station) -> Result<StationId, SimError> {
        let id = StationId::new(self.stations.len() as u8);
        station.set_id(id);
        self.stations
            .push(station)
            .map_err(|_| SimError::StationTableFull)?;
        Ok(id)
    }

    /// Put every station under management at the given dial
    pub fn setup(&mut self, dial: DialFrequency, now: Millis, meter: &mut dyn SignalMeter) {
        let mut ctx = StationContext {
            pool: &mut self.pool,
            meter,
            config: &self.config,
        };
        self.manager.setup(&mut self.stations, &mut ctx, dial, now);
        self.scheduler.update(&mut self.stations, &mut ctx, dial);
    }

    /// One main-loop pass; false if a station asked to stop
    pub fn tick(&mut self, now: Millis, dial: DialFrequency, meter: &mut dyn SignalMeter) -> bool {
        let mut ctx = StationContext {
            pool: &mut self.pool,
            meter,
            config: &self.config,
        };
        self.manager.update_stations(&mut self.stations, &mut ctx, dial, now);
        self.scheduler.tick(&mut self.stations, &mut ctx, now, dial)
    }

    /// Generators may have lost their registers
    pub fn mark_hardware_unknown(&mut self) {
        self.scheduler.mark_hardware_unknown();
    }

    /// Hand queued hardware writes to `apply` as `(slot, command)`
    pub fn drain_commands(&mut self, apply: impl FnMut(usize, GeneratorCommand)) {
        self.pool.drain_commands(apply);
    }

    /// Enable or disable dial-following relocation
    pub fn set_pipelining(&mut self, enabled: bool) {
        self.manager.set_pipelining(enabled);
    }

    /// Generator pool
    #[must_use]
    pub const fn pool(&self) -> &GeneratorPool {
        &self.pool
    }

    /// Station table
    #[must_use]
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// One station
    #[must_use]
    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    /// Lifecycle manager
    #[must_use]
    pub const fn manager(&self) -> &StationManager {
        &self.manager
    }

    /// Runtime configuration
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Runtime configuration, e.g. to follow a BFO change
    pub fn config_mut(&mut self) -> &mut SimConfig {
        &mut self.config
    }
}
