//! Jammer Machine
//!
//! A carrier that wanders in frequency by damped Brownian motion and drops
//! out for short random mutes. It never completes.

use super::{CarrierEdge, Modulator};
use crate::rng::Rng;
use crate::types::{Deadline, Millis, Transition};
#[cfg(feature = "embedded")]
use micromath::F32Ext;

/// Drift and mute parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JammerTiming {
    /// Drift update and state check interval (ms)
    pub interval_ms: u32,
    /// Offset is clamped to +/- this (Hz)
    pub max_drift_hz: f32,
    /// Largest velocity kick per update, and the change-report threshold (Hz)
    pub step_hz: f32,
    /// Velocity retained per update
    pub damping: f32,
    /// Chance per interval of starting a mute (percent)
    pub mute_percent: u32,
    /// Shortest mute (ms)
    pub mute_min_ms: u32,
    /// Longest mute (ms)
    pub mute_max_ms: u32,
}

impl Default for JammerTiming {
    fn default() -> Self {
        Self {
            interval_ms: 50,
            max_drift_hz: 2000.0,
            step_hz: 25.0,
            damping: 0.95,
            mute_percent: 15,
            mute_min_ms: 20,
            mute_max_ms: 200,
        }
    }
}

/// Damped random walk of the carrier offset
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BrownianDrift {
    offset_hz: f32,
    velocity: f32,
}

impl BrownianDrift {
    /// Start from a given offset and velocity
    #[must_use]
    pub const fn new(offset_hz: f32, velocity: f32) -> Self {
        Self {
            offset_hz,
            velocity,
        }
    }

    /// Current offset (Hz)
    #[must_use]
    pub const fn offset_hz(&self) -> f32 {
        self.offset_hz
    }

    /// Current velocity (Hz per update)
    #[must_use]
    pub const fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Apply one update with a kick in `[-0.5, 0.5)`
    ///
    /// At the clamp the walk bounces back at half speed.
    pub fn advance(&mut self, kick: f32, timing: &JammerTiming) {
        self.velocity += kick * timing.step_hz;
        self.velocity *= timing.damping;
        self.offset_hz += self.velocity;

        if self.offset_hz > timing.max_drift_hz {
            self.offset_hz = timing.max_drift_hz;
            self.velocity = -self.velocity.abs() * 0.5;
        } else if self.offset_hz < -timing.max_drift_hz {
            self.offset_hz = -timing.max_drift_hz;
            self.velocity = self.velocity.abs() * 0.5;
        }
    }
}

/// Jammer machine
#[derive(Clone, Debug)]
pub struct Jammer {
    active: bool,
    transmitting: bool,
    drift: BrownianDrift,
    reported_offset_hz: f32,
    next_drift: Deadline,
    deadline: Deadline,
    timing: JammerTiming,
    edge: CarrierEdge,
    rng: Rng,
}

impl Jammer {
    /// Idle jammer
    #[must_use]
    pub fn new(timing: JammerTiming, seed: u32) -> Self {
        Self {
            active: false,
            transmitting: false,
            drift: BrownianDrift::default(),
            reported_offset_hz: 0.0,
            next_drift: Deadline::Unscheduled,
            deadline: Deadline::Unscheduled,
            timing,
            edge: CarrierEdge::default(),
            rng: Rng::new(seed),
        }
    }

    /// Start transmitting at the next step
    pub fn start(&mut self) {
        self.active = true;
        self.transmitting = true;
        self.deadline = Deadline::Unscheduled;
        self.next_drift = Deadline::Unscheduled;
        self.edge.reset();
    }

    /// Current carrier offset from the station frequency (Hz)
    #[must_use]
    pub const fn offset_hz(&self) -> f32 {
        self.drift.offset_hz()
    }

    /// True unless muted
    #[must_use]
    pub const fn is_transmitting(&self) -> bool {
        self.transmitting
    }

    fn apply_drift(&mut self, now: Millis) {
        if self.next_drift.is_scheduled() && !self.next_drift.is_due(now) {
            return;
        }
        let kick = self.rng.unit() - 0.5;
        self.drift.advance(kick, &self.timing);
        self.next_drift = Deadline::after(now, self.timing.interval_ms);
    }

    fn mute_ms(&mut self) -> u32 {
        let span = self.timing.mute_max_ms.saturating_sub(self.timing.mute_min_ms);
        self.timing.mute_min_ms + self.rng.below(span + 1)
    }

    fn update_state(&mut self, now: Millis) {
        if self.transmitting && self.rng.chance(self.timing.mute_percent) {
            self.transmitting = false;
            let mute = self.mute_ms();
            self.deadline = Deadline::after(now, mute);
        } else {
            self.transmitting = true;
            self.deadline = Deadline::after(now, self.timing.interval_ms);
        }
    }
}

impl Modulator for Jammer {
    fn step(&mut self, now: Millis) -> Transition {
        if !self.active {
            return self.edge.report(false);
        }
        self.apply_drift(now);

        if !self.deadline.is_scheduled() {
            self.deadline = Deadline::after(now, self.timing.interval_ms);
        } else if self.deadline.is_due(now) {
            self.update_state(now);
        }

        let transition = self.edge.report(self.transmitting);
        match transition {
            Transition::TurnOn => {
                self.reported_offset_hz = self.drift.offset_hz();
                transition
            }
            Transition::LeaveOn
                if (self.drift.offset_hz() - self.reported_offset_hz).abs() > self.timing.step_hz =>
            {
                self.reported_offset_hz = self.drift.offset_hz();
                Transition::ChangeFrequency
            }
            _ => transition,
        }
    }

    fn is_complete(&self) -> bool {
        false
    }
}
