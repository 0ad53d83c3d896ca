//! Signal-Strength Meter
//!
//! Stations report carrier activity as charge pulses. The meter behaves
//! like a capacitor: pulses charge it and it leaks at a fixed rate. A
//! negative pulse is a "lock" pulse from a station tuned to zero beat; it
//! charges the meter like any other pulse and also drives the lock
//! indicator.

use crate::config::{SimConfig, CHARGE_SPAN_HZ, MAX_CHARGE};
use crate::types::{DialFrequency, Millis};
#[cfg(feature = "embedded")]
use micromath::F32Ext;

/// Receiver of carrier charge pulses
pub trait SignalMeter {
    /// Add one pulse; negative amounts are lock pulses
    fn add_charge(&mut self, amount: i16);
}

/// Meter that ignores every pulse
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMeter;

impl SignalMeter for NullMeter {
    fn add_charge(&mut self, _amount: i16) {}
}

/// Charge pulse for a carrier at `target_hz` heard with the dial at `dial`
///
/// Zero outside the receiver passband. Within the lock window of zero
/// beat the pulse is negated.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn carrier_charge(target_hz: f64, dial: DialFrequency, config: &SimConfig) -> i16 {
    let diff = (dial.as_f64() - (target_hz - f64::from(config.audio_offset_hz))) as f32;
    if !(0.0..=CHARGE_SPAN_HZ).contains(&diff) {
        return 0;
    }
    let proximity = 1.0 - diff / CHARGE_SPAN_HZ;
    let charge = (proximity * proximity * MAX_CHARGE).floor() as i16;
    let beat = (target_hz - dial.as_f64()) as f32;
    if charge > 0 && beat.abs() <= config.lock_window_hz {
        -charge
    } else {
        charge
    }
}

/// Capacitor-style accumulator
#[derive(Clone, Debug)]
pub struct ChargeMeter {
    accumulator: u16,
    lock: u16,
    last_decay: Millis,
}

impl Default for ChargeMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChargeMeter {
    /// Full-scale accumulator value
    pub const MAX_ACCUMULATOR: u16 = 510;
    /// Full-scale lock accumulator value
    pub const MAX_LOCK: u16 = 255;
    /// Accumulator leak per decay interval
    pub const DECAY_STEP: u16 = 16;
    /// Lock accumulator leak per decay interval
    pub const LOCK_DECAY_STEP: u16 = 64;
    /// Decay interval (ms)
    pub const DECAY_INTERVAL_MS: u32 = 50;

    /// Empty meter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            accumulator: 0,
            lock: 0,
            last_decay: Millis::ZERO,
        }
    }

    /// Leak charge if a decay interval has passed
    pub fn decay(&mut self, now: Millis) {
        if now.since(self.last_decay) < Self::DECAY_INTERVAL_MS {
            return;
        }
        self.accumulator = self.accumulator.saturating_sub(Self::DECAY_STEP);
        self.lock = self.lock.saturating_sub(Self::LOCK_DECAY_STEP);
        self.last_decay = now;
    }

    /// Signal strength scaled to 0-255
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn strength(&self) -> u8 {
        (u32::from(self.accumulator) * 255 / u32::from(Self::MAX_ACCUMULATOR)) as u8
    }

    /// Lock indicator level, 0-255
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn lock_level(&self) -> u8 {
        self.lock.min(Self::MAX_LOCK) as u8
    }

    /// Drop all charge
    pub fn clear(&mut self) {
        self.accumulator = 0;
        self.lock = 0;
    }
}

impl SignalMeter for ChargeMeter {
    fn add_charge(&mut self, amount: i16) {
        let magnitude = amount.unsigned_abs();
        if amount < 0 {
            self.lock = (self.lock + magnitude).min(Self::MAX_LOCK);
        }
        self.accumulator = (self.accumulator + magnitude).min(Self::MAX_ACCUMULATOR);
    }
}
