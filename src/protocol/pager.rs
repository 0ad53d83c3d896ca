//! Two-Tone Pager Machine
//!
//! Sequential two-tone paging: tone A for one second, tone B for three
//! seconds with no gap, then a random silence before the next page. The
//! machine only sequences the phases; the station picks the tones.

use super::{CarrierEdge, Modulator};
use crate::rng::Rng;
use crate::types::{Deadline, Millis, Transition};

/// Phase durations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagerTiming {
    /// Tone A length (ms)
    pub tone_a_ms: u32,
    /// Tone B length (ms)
    pub tone_b_ms: u32,
    /// Shortest silence between pages (ms)
    pub silence_min_ms: u32,
    /// Longest silence between pages (ms)
    pub silence_max_ms: u32,
}

impl Default for PagerTiming {
    fn default() -> Self {
        Self {
            tone_a_ms: 1000,
            tone_b_ms: 3000,
            silence_min_ms: 3000,
            silence_max_ms: 6000,
        }
    }
}

/// Where in the page cycle the machine is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PagerPhase {
    /// First tone
    ToneA,
    /// Second tone
    ToneB,
    /// Between pages
    #[default]
    Silence,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PagerPhase {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ToneA => defmt::write!(f, "A"),
            Self::ToneB => defmt::write!(f, "B"),
            Self::Silence => defmt::write!(f, "-"),
        }
    }
}

/// Pager sequencing machine
#[derive(Clone, Debug)]
pub struct Pager {
    phase: PagerPhase,
    active: bool,
    repeat: bool,
    deadline: Deadline,
    timing: PagerTiming,
    edge: CarrierEdge,
    rng: Rng,
}

impl Pager {
    /// Idle pager
    #[must_use]
    pub fn new(timing: PagerTiming, seed: u32) -> Self {
        Self {
            phase: PagerPhase::Silence,
            active: false,
            repeat: false,
            deadline: Deadline::Unscheduled,
            timing,
            edge: CarrierEdge::default(),
            rng: Rng::new(seed),
        }
    }

    /// Start a page at the next step; loop with random silences if `repeat`
    pub fn start(&mut self, repeat: bool) {
        self.repeat = repeat;
        self.active = true;
        self.phase = PagerPhase::ToneA;
        self.deadline = Deadline::Unscheduled;
        self.edge.reset();
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> PagerPhase {
        self.phase
    }

    /// True while a tone is being sent
    #[must_use]
    pub fn is_transmitting(&self) -> bool {
        self.edge.is_on()
    }

    fn silence_ms(&mut self) -> u32 {
        let span = self.timing.silence_max_ms.saturating_sub(self.timing.silence_min_ms);
        self.timing.silence_min_ms + self.rng.below(span)
    }

    fn advance(&mut self, now: Millis) {
        match self.phase {
            PagerPhase::ToneA => {
                self.phase = PagerPhase::ToneB;
                self.deadline = Deadline::after(now, self.timing.tone_b_ms);
            }
            PagerPhase::ToneB => {
                self.phase = PagerPhase::Silence;
                if self.repeat {
                    let silence = self.silence_ms();
                    self.deadline = Deadline::after(now, silence);
                } else {
                    self.active = false;
                    self.deadline = Deadline::Unscheduled;
                }
            }
            PagerPhase::Silence => {
                self.phase = PagerPhase::ToneA;
                self.deadline = Deadline::after(now, self.timing.tone_a_ms);
            }
        }
    }
}

impl Modulator for Pager {
    fn step(&mut self, now: Millis) -> Transition {
        if !self.active {
            return self.edge.report(false);
        }
        if !self.deadline.is_scheduled() {
            self.deadline = Deadline::after(now, self.timing.tone_a_ms);
            return self.edge.report(true);
        }
        if !self.deadline.is_due(now) {
            return self.edge.report(self.edge.is_on());
        }

        let before = self.phase;
        self.advance(now);
        let tone = matches!(self.phase, PagerPhase::ToneA | PagerPhase::ToneB);
        let transition = self.edge.report(tone);
        if transition == Transition::LeaveOn && before != self.phase {
            Transition::ChangeFrequency
        } else {
            transition
        }
    }

    fn is_complete(&self) -> bool {
        !self.active
    }
}
