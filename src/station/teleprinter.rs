//! RTTY station
//!
//! Holds a steady mark for three seconds, then sends its CQ three times
//! with a three second mark between passes. After a final mark it goes
//! off the air for six seconds and releases its generator.
//!
//! Mark is the upper tone, 170 Hz above the space tone.

use super::content::{random_callsign, rtty_message, Callsign, Message};
use super::{note_truncation, realize, Behavior, StationContext, StationCore};
use crate::generator::GeneratorPool;
use crate::protocol::{Modulator, Teleprinter, TeleprinterTiming};
use crate::rng::Rng;
use crate::types::{Channel, Deadline, Millis, Transition};

/// Mark/space separation (Hz)
pub const SHIFT_HZ: f32 = 170.0;
const MARK_MS: u32 = 3000;
const BREAK_MS: u32 = 6000;
const RETRY_MS: u32 = 1000;
const PASSES: u8 = 3;

/// Position in the transmission cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TeleprinterPhase {
    /// Steady mark before the first pass
    #[default]
    LeadMark,
    /// Sending the message
    Sending,
    /// Steady mark between passes
    InterMark,
    /// Steady mark after the last pass
    FinalMark,
    /// Off the air, generator released
    Break,
}

/// RTTY station state
#[derive(Debug)]
pub struct TeleprinterStation {
    machine: Teleprinter,
    callsign: Callsign,
    message: Message,
    phase: TeleprinterPhase,
    passes: u8,
    next: Deadline,
}

impl TeleprinterStation {
    pub(crate) fn new(rng: &mut Rng) -> Self {
        let callsign = random_callsign(rng);
        let message = rtty_message(&callsign);
        Self {
            machine: Teleprinter::new(TeleprinterTiming::default()),
            callsign,
            message,
            phase: TeleprinterPhase::LeadMark,
            passes: 0,
            next: Deadline::Unscheduled,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> TeleprinterPhase {
        self.phase
    }

    /// Completed passes of the message
    #[must_use]
    pub const fn passes(&self) -> u8 {
        self.passes
    }

    /// Current message text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn hold_mark(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, phase: TeleprinterPhase, now: Millis) {
        self.phase = phase;
        self.next = Deadline::after(now, MARK_MS);
        core.set_carrier(true);
        realize(core, &*self, ctx.pool, ctx.config);
    }

    fn send_pass(&mut self, core: &mut StationCore) {
        self.phase = TeleprinterPhase::Sending;
        self.next = Deadline::Unscheduled;
        note_truncation(core, self.machine.start(&self.message, false));
    }

    fn step_sending(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis) {
        match self.machine.step(now) {
            Transition::TurnOn => {
                core.set_carrier(true);
                realize(core, &*self, ctx.pool, ctx.config);
                core.send_charge(ctx);
            }
            Transition::LeaveOn => core.send_charge(ctx),
            Transition::TurnOff => {
                core.set_carrier(false);
                realize(core, &*self, ctx.pool, ctx.config);
            }
            _ => {}
        }
        if self.machine.is_complete() {
            self.passes += 1;
            let next = if self.passes >= PASSES {
                TeleprinterPhase::FinalMark
            } else {
                TeleprinterPhase::InterMark
            };
            self.hold_mark(core, ctx, next, now);
        }
    }
}

impl Behavior for TeleprinterStation {
    fn start(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis) {
        self.passes = 0;
        core.retune(ctx.config);
        self.hold_mark(core, ctx, TeleprinterPhase::LeadMark, now);
    }

    fn step(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis) {
        if self.phase == TeleprinterPhase::Break {
            if !self.next.is_due(now) {
                return;
            }
            if core.acquire(ctx.pool, 1).is_ok() {
                self.start(core, ctx, now);
            } else {
                self.next = Deadline::after(now, RETRY_MS);
            }
            return;
        }
        if !core.holds_generator() {
            return;
        }

        match self.phase {
            TeleprinterPhase::Sending => self.step_sending(core, ctx, now),
            TeleprinterPhase::LeadMark | TeleprinterPhase::InterMark => {
                core.send_charge(ctx);
                if self.next.is_due(now) {
                    self.send_pass(core);
                }
            }
            TeleprinterPhase::FinalMark => {
                core.send_charge(ctx);
                if self.next.is_due(now) {
                    self.phase = TeleprinterPhase::Break;
                    self.next = Deadline::after(now, BREAK_MS);
                    core.set_carrier(false);
                    core.release(ctx.pool);
                }
            }
            TeleprinterPhase::Break => {}
        }
    }

    fn program(&self, core: &StationCore, pool: &mut GeneratorPool) {
        let Some(gen) = core.generator(pool, 0) else {
            return;
        };
        if self.phase == TeleprinterPhase::Break {
            gen.silence();
            return;
        }
        gen.set_frequency(Channel::Main, core.audio_hz() + SHIFT_HZ);
        gen.set_frequency(Channel::Alt, core.audio_hz());
        gen.select(Channel::keyed(core.carrier()));
    }

    fn randomize(&mut self, core: &mut StationCore) {
        self.callsign = random_callsign(core.rng());
        self.message = rtty_message(&self.callsign);
        self.phase = TeleprinterPhase::LeadMark;
        self.passes = 0;
        self.next = Deadline::Unscheduled;
    }
}
