//! Jammer station
//!
//! A wandering carrier that never completes and never releases its
//! generator on its own.

use super::{realize, Behavior, StationContext, StationCore};
use crate::generator::GeneratorPool;
use crate::protocol::{Jammer, JammerTiming, Modulator};
use crate::rng::Rng;
use crate::types::{Channel, Millis, Transition};

/// Jammer station state
#[derive(Debug)]
pub struct JammerStation {
    machine: Jammer,
}

impl JammerStation {
    pub(crate) fn new(rng: &mut Rng) -> Self {
        Self {
            machine: Jammer::new(JammerTiming::default(), rng.next_u32()),
        }
    }

    /// Current drift from the station frequency (Hz)
    #[must_use]
    pub const fn offset_hz(&self) -> f32 {
        self.machine.offset_hz()
    }
}

impl Behavior for JammerStation {
    fn start(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, _now: Millis) {
        self.machine.start();
        core.set_carrier(false);
        core.retune(ctx.config);
        realize(core, &*self, ctx.pool, ctx.config);
    }

    fn step(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, now: Millis) {
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
            Transition::ChangeFrequency => {
                realize(core, &*self, ctx.pool, ctx.config);
                core.send_charge(ctx);
            }
            Transition::LeaveOff | Transition::MessageComplete => {}
        }
    }

    fn program(&self, core: &StationCore, pool: &mut GeneratorPool) {
        let Some(gen) = core.generator(pool, 0) else {
            return;
        };
        if core.carrier() {
            let hz = core.audio_hz() + self.machine.offset_hz();
            gen.set_frequency(Channel::Main, hz);
            gen.set_frequency(Channel::Alt, hz);
            gen.select(Channel::Main);
        } else {
            gen.silence();
        }
    }

    fn randomize(&mut self, core: &mut StationCore) {
        self.machine = Jammer::new(JammerTiming::default(), core.rng().next_u32());
    }
}
