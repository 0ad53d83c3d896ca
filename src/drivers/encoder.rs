//! Rotary Tuning Knob
//!
//! Decodes the front-panel quadrature encoder into detents and turns
//! detents into a bounded dial frequency. Both halves are pure; the
//! firmware polls the A/B pins and publishes the dial to the engine loop.

use crate::config::{DIAL_MAX_HZ, DIAL_MIN_HZ};
use crate::types::{DialFrequency, Millis};

/// Edges per mechanical detent
const EDGES_PER_DETENT: i8 = 4;

/// Detents closer together than this count as a fast spin
const FAST_DETENT_MS: u32 = 40;

/// Step multiplier while spinning fast
const FAST_MULTIPLIER: u32 = 10;

/// Direction of one detent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detent {
    /// Clockwise, frequency up
    Up,
    /// Counter-clockwise, frequency down
    Down,
}

#[cfg(feature = "embedded")]
impl defmt::Format for Detent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Up => defmt::write!(f, "UP"),
            Self::Down => defmt::write!(f, "DOWN"),
        }
    }
}

/// Gray-code quadrature decoder
///
/// Counts valid edges and reports a detent every four of them. Bounce
/// back and forth cancels out; a skipped state is ignored.
#[derive(Debug, Default)]
pub struct Quadrature {
    last: Option<u8>,
    edges: i8,
}

impl Quadrature {
    /// Decoder that takes its reference from the first sample
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None, edges: 0 }
    }

    /// Feed the current A/B pin levels
    pub fn update(&mut self, a: bool, b: bool) -> Option<Detent> {
        let state = (u8::from(a) << 1) | u8::from(b);
        let last = self.last.replace(state)?;
        // Forward order is 00 -> 01 -> 11 -> 10 -> 00
        self.edges += match (last, state) {
            (0b00, 0b01) | (0b01, 0b11) | (0b11, 0b10) | (0b10, 0b00) => 1,
            (0b00, 0b10) | (0b10, 0b11) | (0b11, 0b01) | (0b01, 0b00) => -1,
            _ => 0,
        };
        if self.edges >= EDGES_PER_DETENT {
            self.edges -= EDGES_PER_DETENT;
            Some(Detent::Up)
        } else if self.edges <= -EDGES_PER_DETENT {
            self.edges += EDGES_PER_DETENT;
            Some(Detent::Down)
        } else {
            None
        }
    }
}

/// Dial position driven by detents, with spin acceleration
#[derive(Debug)]
pub struct TuningKnob {
    hz: u32,
    step_hz: u32,
    last_detent: Option<Millis>,
}

impl TuningKnob {
    /// Knob at `hz`, moving `step_hz` per detent
    #[must_use]
    pub fn new(hz: u32, step_hz: u32) -> Self {
        Self {
            hz: hz.clamp(DIAL_MIN_HZ, DIAL_MAX_HZ),
            step_hz,
            last_detent: None,
        }
    }

    /// Current dial
    #[must_use]
    pub const fn dial(&self) -> DialFrequency {
        DialFrequency::from_hz(self.hz)
    }

    /// Apply one detent at `now`
    pub fn turn(&mut self, detent: Detent, now: Millis) -> DialFrequency {
        let fast = self
            .last_detent
            .is_some_and(|t| now.since(t) < FAST_DETENT_MS);
        self.last_detent = Some(now);

        let step = if fast {
            self.step_hz.saturating_mul(FAST_MULTIPLIER)
        } else {
            self.step_hz
        };
        self.hz = match detent {
            Detent::Up => self.hz.saturating_add(step).min(DIAL_MAX_HZ),
            Detent::Down => self.hz.saturating_sub(step).max(DIAL_MIN_HZ),
        };
        self.dial()
    }
}
