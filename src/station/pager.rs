//! Two-tone pager
//!
//! Picks a fresh tone pair at the start of every page and releases its
//! generator during the silence between pages. The dual variant plays a
//! second, independent pair on a second generator.

use super::{realize, Behavior, StationContext, StationCore};
use crate::generator::GeneratorPool;
use crate::protocol::{Modulator, Pager, PagerPhase, PagerTiming};
use crate::rng::Rng;
use crate::types::{Channel, Millis, Transition};

const TONE_MIN_HZ: u32 = 650;
const TONE_SPAN_HZ: u32 = 900;
const TONE_MAX_HZ: u32 = 1650;
const TONE_SEPARATION_HZ: u32 = 100;

/// Tone offsets above the beat note (Hz)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TonePair {
    /// First tone
    pub a_hz: f32,
    /// Second tone
    pub b_hz: f32,
}

impl TonePair {
    /// Random pair in 650-1650 Hz
    ///
    /// Tone B is either below tone A or at least 100 Hz above it.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn random(rng: &mut Rng) -> Self {
        let a = TONE_MIN_HZ + rng.below(TONE_SPAN_HZ);
        let pick = rng.below(TONE_SPAN_HZ);
        let below_a = a - TONE_MIN_HZ;
        let b = if pick < below_a {
            TONE_MIN_HZ + pick
        } else {
            a + TONE_SEPARATION_HZ + (pick - below_a)
        };
        Self {
            a_hz: a as f32,
            b_hz: b.min(TONE_MAX_HZ) as f32,
        }
    }

    fn tone(self, phase: PagerPhase) -> Option<f32> {
        match phase {
            PagerPhase::ToneA => Some(self.a_hz),
            PagerPhase::ToneB => Some(self.b_hz),
            PagerPhase::Silence => None,
        }
    }
}

/// Pager station state
#[derive(Debug)]
pub struct PagerStation {
    machine: Pager,
    dual: bool,
    tones: [TonePair; 2],
}

impl PagerStation {
    pub(crate) fn new(dual: bool, rng: &mut Rng) -> Self {
        Self {
            machine: Pager::new(PagerTiming::default(), rng.next_u32()),
            dual,
            tones: [TonePair::random(rng), TonePair::random(rng)],
        }
    }

    /// Drives two generators
    #[must_use]
    pub const fn is_dual(&self) -> bool {
        self.dual
    }

    /// Tone pair played on the `n`th generator
    #[must_use]
    pub fn tones(&self, n: usize) -> Option<TonePair> {
        self.tones.get(n).copied()
    }

    /// Sequencing phase
    #[must_use]
    pub const fn phase(&self) -> PagerPhase {
        self.machine.phase()
    }

    fn regenerate(&mut self, rng: &mut Rng) {
        for pair in &mut self.tones {
            *pair = TonePair::random(rng);
        }
    }
}

impl Behavior for PagerStation {
    fn generators_needed(&self) -> usize {
        if self.dual {
            2
        } else {
            1
        }
    }

    fn start(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, _now: Millis) {
        self.machine.start(true);
        core.set_carrier(false);
        core.retune(ctx.config);
        realize(core, &*self, ctx.pool, ctx.config);
    }

    fn step(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis) {
        match self.machine.step(now) {
            Transition::TurnOn => {
                if self.machine.phase() == PagerPhase::ToneA {
                    self.regenerate(core.rng());
                }
                if !core.holds_generator() {
                    if core.acquire(ctx.pool, self.generators_needed()).is_err() {
                        core.set_carrier(false);
                        return;
                    }
                    core.retune(ctx.config);
                }
                core.set_carrier(true);
                realize(core, &*self, ctx.pool, ctx.config);
                core.send_charge(ctx);
            }
            Transition::LeaveOn => core.send_charge(ctx),
            Transition::ChangeFrequency => {
                realize(core, &*self, ctx.pool, ctx.config);
                core.send_charge(ctx);
            }
            Transition::TurnOff => {
                core.set_carrier(false);
                realize(core, &*self, ctx.pool, ctx.config);
                core.release(ctx.pool);
            }
            Transition::LeaveOff | Transition::MessageComplete => {}
        }
    }

    fn program(&self, core: &StationCore, pool: &mut GeneratorPool) {
        let phase = self.machine.phase();
        for (n, pair) in self.tones.iter().take(self.generators_needed()).enumerate() {
            let Some(gen) = core.generator(pool, n) else {
                continue;
            };
            match pair.tone(phase) {
                Some(tone) if core.carrier() => {
                    let hz = core.audio_hz() + tone;
                    gen.set_frequency(Channel::Main, hz);
                    gen.set_frequency(Channel::Alt, hz);
                    gen.select(Channel::Main);
                }
                _ => gen.silence(),
            }
        }
    }

    fn randomize(&mut self, core: &mut StationCore) {
        self.regenerate(core.rng());
    }
}
