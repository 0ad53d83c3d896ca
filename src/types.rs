//! Shared types used across the simulation engine
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time: wraparound-safe time, dial frequency with tenths,
//! generator channels, modulator transition codes and station lifecycle.

use core::fmt;

/// Monotonic millisecond timestamp from the host clock
///
/// The counter is 32 bits wide and wraps after ~49.7 days. All comparisons
/// go through [`Millis::has_reached`], which interprets the wrapped
/// difference as signed so deadlines survive the wrap.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Millis(u32);

impl Millis {
    /// Time zero
    pub const ZERO: Self = Self(0);

    /// Create a timestamp from a raw millisecond count
    #[must_use]
    pub const fn new(ms: u32) -> Self {
        Self(ms)
    }

    /// Raw millisecond count
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Timestamp `ms` milliseconds after this one (wrapping)
    #[must_use]
    pub const fn after(self, ms: u32) -> Self {
        Self(self.0.wrapping_add(ms))
    }

    /// Milliseconds elapsed since `earlier` (wrapping)
    #[must_use]
    pub const fn since(self, earlier: Self) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// True once `self` is at or past `deadline`
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn has_reached(self, deadline: Self) -> bool {
        self.0.wrapping_sub(deadline.0) as i32 >= 0
    }
}

impl fmt::Debug for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Millis {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}ms", self.0);
    }
}

/// A point in time an event is scheduled for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Deadline {
    /// Nothing scheduled yet
    #[default]
    Unscheduled,
    /// Fires once the clock reaches this time
    At(Millis),
}

impl Deadline {
    /// Deadline `ms` milliseconds after `now`
    #[must_use]
    pub const fn after(now: Millis, ms: u32) -> Self {
        Self::At(now.after(ms))
    }

    /// True if a time has been set
    #[must_use]
    pub const fn is_scheduled(self) -> bool {
        matches!(self, Self::At(_))
    }

    /// True if scheduled and `now` has reached it
    #[must_use]
    pub const fn is_due(self, now: Millis) -> bool {
        match self {
            Self::Unscheduled => false,
            Self::At(at) => now.has_reached(at),
        }
    }

    /// Scheduled time, if any
    #[must_use]
    pub const fn time(self) -> Option<Millis> {
        match self {
            Self::Unscheduled => None,
            Self::At(at) => Some(at),
        }
    }
}

/// Receiver dial frequency as reported by the tuning front end
///
/// Whole hertz plus a tenths-of-hertz sub-unit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DialFrequency {
    hz: u32,
    tenths: u8,
}

impl DialFrequency {
    /// Dial frequency in whole hertz
    #[must_use]
    pub const fn from_hz(hz: u32) -> Self {
        Self { hz, tenths: 0 }
    }

    /// Dial frequency with a tenths-of-hertz component (clamped to 0..=9)
    #[must_use]
    pub const fn with_tenths(hz: u32, tenths: u8) -> Self {
        let tenths = if tenths > 9 { 9 } else { tenths };
        Self { hz, tenths }
    }

    /// Whole hertz
    #[must_use]
    pub const fn hz(self) -> u32 {
        self.hz
    }

    /// Tenths of a hertz
    #[must_use]
    pub const fn tenths(self) -> u8 {
        self.tenths
    }

    /// Full-precision frequency for audio arithmetic
    ///
    /// `f64` keeps sub-hertz resolution at VHF.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.hz) + f64::from(self.tenths) / 10.0
    }
}

impl fmt::Debug for DialFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} Hz", self.hz, self.tenths)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DialFrequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}.{} Hz", self.hz, self.tenths);
    }
}

/// One of the two frequency registers of a tone generator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Channel {
    /// Primary register (FREQ0)
    #[default]
    Main,
    /// Alternate register (FREQ1)
    Alt,
}

impl Channel {
    /// Register index (0 or 1)
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Main => 0,
            Self::Alt => 1,
        }
    }

    /// Main when the carrier is keyed, Alt otherwise
    #[must_use]
    pub const fn keyed(on: bool) -> Self {
        if on {
            Self::Main
        } else {
            Self::Alt
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Main => defmt::write!(f, "MAIN"),
            Self::Alt => defmt::write!(f, "ALT"),
        }
    }
}

/// Result of advancing a modulator by one step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Carrier turned on this step
    TurnOn,
    /// Carrier turned off this step
    TurnOff,
    /// Carrier was on and stays on
    LeaveOn,
    /// Carrier was off and stays off
    LeaveOff,
    /// Carrier stays on but the tone frequency changed
    ChangeFrequency,
    /// Message finished (reported exactly once)
    MessageComplete,
}

impl Transition {
    /// Transition code for a carrier level change (or lack of one)
    #[must_use]
    pub const fn from_levels(was_on: bool, now_on: bool) -> Self {
        match (was_on, now_on) {
            (false, true) => Self::TurnOn,
            (true, false) => Self::TurnOff,
            (true, true) => Self::LeaveOn,
            (false, false) => Self::LeaveOff,
        }
    }

    /// True if the carrier is on after this transition
    #[must_use]
    pub const fn carrier_on(self) -> bool {
        matches!(self, Self::TurnOn | Self::LeaveOn | Self::ChangeFrequency)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Transition {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::TurnOn => defmt::write!(f, "ON"),
            Self::TurnOff => defmt::write!(f, "OFF"),
            Self::LeaveOn => defmt::write!(f, "on"),
            Self::LeaveOff => defmt::write!(f, "off"),
            Self::ChangeFrequency => defmt::write!(f, "QSY"),
            Self::MessageComplete => defmt::write!(f, "DONE"),
        }
    }
}

/// Station lifecycle as seen by the manager
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Far from the dial; keeps no generator
    #[default]
    Dormant,
    /// Near the dial; eligible for a generator
    Active,
    /// Assigned a generator slot
    Audible,
    /// In range but no slot free
    Silent,
}

impl Lifecycle {
    /// Only audible stations may hold a generator
    #[must_use]
    pub const fn permits_generator(self) -> bool {
        matches!(self, Self::Audible)
    }

    /// Eligible to be granted a free slot
    #[must_use]
    pub const fn wants_slot(self) -> bool {
        matches!(self, Self::Active | Self::Silent)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Lifecycle {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Dormant => defmt::write!(f, "DORMANT"),
            Self::Active => defmt::write!(f, "ACTIVE"),
            Self::Audible => defmt::write!(f, "AUDIBLE"),
            Self::Silent => defmt::write!(f, "SILENT"),
        }
    }
}

/// Direction the operator is turning the dial
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TuningDirection {
    /// Frequency increasing
    Up,
    /// Frequency decreasing
    Down,
    /// No significant movement within the settle timeout
    #[default]
    Stopped,
}

impl TuningDirection {
    /// Direction implied by a signed frequency change
    #[must_use]
    pub const fn from_change(change: i64) -> Self {
        if change > 0 {
            Self::Up
        } else if change < 0 {
            Self::Down
        } else {
            Self::Stopped
        }
    }

    /// +1, -1 or 0
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
            Self::Stopped => 0,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TuningDirection {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Up => defmt::write!(f, "UP"),
            Self::Down => defmt::write!(f, "DOWN"),
            Self::Stopped => defmt::write!(f, "STOP"),
        }
    }
}

/// Index of a station in the station table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct StationId(u8);

impl StationId {
    /// Wrap a table index
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Table index
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for StationId {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "#{}", self.0);
    }
}

/// Recoverable failures of the simulation core
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimError {
    /// Every generator in the pool is leased
    PoolExhausted,
    /// Station lifecycle does not grant a generator slot
    NotAssigned,
    /// No room left in the station table
    StationTableFull,
    /// Message text was truncated to the buffer size
    MessageTooLong,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted => write!(f, "no free generator"),
            Self::NotAssigned => write!(f, "station holds no generator slot"),
            Self::StationTableFull => write!(f, "station table full"),
            Self::MessageTooLong => write!(f, "message truncated"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SimError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::PoolExhausted => defmt::write!(f, "PoolExhausted"),
            Self::NotAssigned => defmt::write!(f, "NotAssigned"),
            Self::StationTableFull => defmt::write!(f, "StationTableFull"),
            Self::MessageTooLong => defmt::write!(f, "MessageTooLong"),
        }
    }
}
