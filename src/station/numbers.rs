//! Numbers station
//!
//! Cycle: the interval signal six times, thirteen random five-digit groups,
//! an all-zero ending group, then eight seconds off the air before starting
//! over a little off frequency. Each transmission is followed by a two
//! second gap.

use super::content::{ending_group, interval_signal, number_group};
use super::{note_truncation, realize, Behavior, StationContext, StationCore};
use crate::config::SILENT_HZ;
use crate::generator::GeneratorPool;
use crate::protocol::{Modulator, Morse};
use crate::rng::Rng;
use crate::types::{Channel, Deadline, Millis, Transition};

const INTERVAL_REPEATS: u8 = 6;
const GROUP_COUNT: u8 = 13;
const GAP_MS: u32 = 2000;
const CYCLE_DELAY_MS: u32 = 8000;
const RETRY_MS: u32 = 1000;
/// Frequency drift per cycle, in hundredths of a hertz either side
const DRIFT_CENTI_HZ: i32 = 20_000;

/// Position in the broadcast cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NumbersPhase {
    /// Repeating the interval signal
    #[default]
    IntervalSignal,
    /// Sending cipher groups
    Groups,
    /// Sending the ending group
    Ending,
    /// Off the air between broadcasts
    CycleDelay,
}

/// Numbers station state
#[derive(Debug)]
pub struct NumbersStation {
    morse: Morse,
    wpm: u8,
    phase: NumbersPhase,
    sent: u8,
    next: Deadline,
}

impl NumbersStation {
    pub(crate) fn new(wpm: u8, rng: &mut Rng) -> Self {
        Self {
            morse: Morse::new(rng.next_u32()),
            wpm,
            phase: NumbersPhase::IntervalSignal,
            sent: 0,
            next: Deadline::Unscheduled,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> NumbersPhase {
        self.phase
    }

    /// Transmissions completed in the current phase
    #[must_use]
    pub const fn sent(&self) -> u8 {
        self.sent
    }

    fn send_next(&mut self, core: &mut StationCore) {
        let text = match self.phase {
            NumbersPhase::IntervalSignal => interval_signal(),
            NumbersPhase::Groups => number_group(core.rng()),
            NumbersPhase::Ending => ending_group(),
            NumbersPhase::CycleDelay => return,
        };
        note_truncation(core, self.morse.start(&text, self.wpm));
    }

    fn finish_transmission(&mut self, core: &mut StationCore, pool: &mut GeneratorPool, now: Millis) {
        self.sent += 1;
        match self.phase {
            NumbersPhase::IntervalSignal if self.sent >= INTERVAL_REPEATS => {
                self.phase = NumbersPhase::Groups;
                self.sent = 0;
            }
            NumbersPhase::Groups if self.sent >= GROUP_COUNT => {
                self.phase = NumbersPhase::Ending;
                self.sent = 0;
            }
            NumbersPhase::Ending => {
                core.release(pool);
                self.phase = NumbersPhase::CycleDelay;
                self.sent = 0;
                self.next = Deadline::after(now, CYCLE_DELAY_MS);
                return;
            }
            _ => {}
        }
        self.next = Deadline::after(now, GAP_MS);
    }
}

impl Behavior for NumbersStation {
    fn start(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, _now: Millis) {
        self.phase = NumbersPhase::IntervalSignal;
        self.sent = 0;
        self.next = Deadline::Unscheduled;
        core.set_carrier(false);
        core.retune(ctx.config);
        self.send_next(core);
        realize(core, &*self, ctx.pool, ctx.config);
    }

    fn step(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis) {
        match self.morse.step(now) {
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
            Transition::MessageComplete => {
                core.set_carrier(false);
                realize(core, &*self, ctx.pool, ctx.config);
                self.finish_transmission(core, ctx.pool, now);
            }
            Transition::LeaveOff | Transition::ChangeFrequency => {}
        }

        if !self.next.is_due(now) {
            return;
        }
        if self.phase != NumbersPhase::CycleDelay {
            self.next = Deadline::Unscheduled;
            self.send_next(core);
            return;
        }
        if core.acquire(ctx.pool, 1).is_ok() {
            let drift = f64::from(core.rng().spread(DRIFT_CENTI_HZ)) / 100.0;
            core.shift_target(drift);
            self.start(core, ctx, now);
        } else {
            self.next = Deadline::after(now, RETRY_MS);
        }
    }

    fn program(&self, core: &StationCore, pool: &mut GeneratorPool) {
        if let Some(gen) = core.generator(pool, 0) {
            gen.set_frequency(Channel::Main, core.audio_hz());
            gen.set_frequency(Channel::Alt, SILENT_HZ);
            gen.select(Channel::keyed(core.carrier()));
        }
    }

    fn randomize(&mut self, _core: &mut StationCore) {
        self.phase = NumbersPhase::IntervalSignal;
        self.sent = 0;
        self.next = Deadline::Unscheduled;
    }
}
