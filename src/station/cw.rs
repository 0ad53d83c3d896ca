//! CW operator calling CQ
//!
//! Sends `CQ CQ DE <call> <call> K`, releases its generator and waits four
//! seconds before calling again. Every few calls the operator gives up and
//! moves: new frequency, new callsign, slightly different speed.

use super::content::{cq_message, random_callsign, Callsign, Message};
use super::{note_truncation, realize, Behavior, StationContext, StationCore};
use crate::config::SILENT_HZ;
use crate::generator::GeneratorPool;
use crate::protocol::{Modulator, Morse};
use crate::rng::Rng;
use crate::types::{Channel, Deadline, Millis, Transition};

/// Pause between calls (ms)
const CALL_INTERVAL_MS: u32 = 4000;
/// Retry delay after a failed re-acquire is this plus up to `RETRY_SPREAD_MS`
const RETRY_MIN_MS: u32 = 500;
const RETRY_SPREAD_MS: u32 = 1000;
/// Largest move on a QSY, in hundredths of a hertz either side
const QSY_SPREAD_CENTI_HZ: i32 = 25_000;
const WPM_DRIFT: i32 = 4;
const MIN_WPM: u8 = 8;
const MAX_WPM: u8 = 25;

/// CW station state
#[derive(Debug)]
pub struct CwStation {
    morse: Morse,
    callsign: Callsign,
    message: Message,
    wpm: u8,
    base_wpm: u8,
    calls: u32,
    calls_before_qsy: u32,
    resume: Deadline,
}

impl CwStation {
    pub(crate) fn new(wpm: u8, fist: u8, rng: &mut Rng) -> Self {
        let callsign = random_callsign(rng);
        let message = cq_message(&callsign);
        Self {
            morse: Morse::new(rng.next_u32()).with_fist(fist),
            callsign,
            message,
            wpm,
            base_wpm: wpm,
            calls: 0,
            calls_before_qsy: rng.between(3, 8),
            resume: Deadline::Unscheduled,
        }
    }

    /// Current callsign
    #[must_use]
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// Current message text
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Current speed
    #[must_use]
    pub const fn wpm(&self) -> u8 {
        self.wpm
    }

    /// Completed calls since the last QSY
    #[must_use]
    pub const fn calls(&self) -> u32 {
        self.calls
    }

    /// Keying machine
    #[must_use]
    pub const fn morse(&self) -> &Morse {
        &self.morse
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn qsy(&mut self, core: &mut StationCore) {
        let rng = core.rng();
        let shift = f64::from(rng.spread(QSY_SPREAD_CENTI_HZ)) / 100.0;
        self.callsign = random_callsign(rng);
        self.message = cq_message(&self.callsign);
        let wpm = i32::from(self.base_wpm) + rng.spread(WPM_DRIFT);
        self.wpm = wpm.clamp(i32::from(MIN_WPM), i32::from(MAX_WPM)) as u8;
        self.calls = 0;
        self.calls_before_qsy = rng.between(3, 8);
        core.shift_target(shift);
        debug!("{} qsy {}", core.id(), self.callsign.as_str());
    }
}

impl Behavior for CwStation {
    fn start(&mut self, core: &mut StationCore, ctx: &mut StationContext<'_>, _now: Millis) {
        self.resume = Deadline::Unscheduled;
        core.set_carrier(false);
        core.retune(ctx.config);
        note_truncation(core, self.morse.start(&self.message, self.wpm));
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
                self.calls += 1;
                if self.calls >= self.calls_before_qsy {
                    self.qsy(core);
                }
                core.release(ctx.pool);
                self.resume = Deadline::after(now, CALL_INTERVAL_MS);
            }
            Transition::LeaveOff | Transition::ChangeFrequency => {}
        }

        if self.resume.is_due(now) {
            if core.acquire(ctx.pool, 1).is_ok() {
                self.start(core, ctx, now);
            } else {
                let retry = RETRY_MIN_MS + core.rng().below(RETRY_SPREAD_MS);
                self.resume = Deadline::after(now, retry);
            }
        }
    }

    fn program(&self, core: &StationCore, pool: &mut GeneratorPool) {
        if let Some(gen) = core.generator(pool, 0) {
            gen.set_frequency(Channel::Main, core.audio_hz());
            gen.set_frequency(Channel::Alt, SILENT_HZ);
            gen.select(Channel::keyed(core.carrier()));
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn randomize(&mut self, core: &mut StationCore) {
        let rng = core.rng();
        self.callsign = random_callsign(rng);
        self.message = cq_message(&self.callsign);
        self.wpm = rng.between(u32::from(MIN_WPM), u32::from(MAX_WPM)) as u8;
        self.base_wpm = self.wpm;
        self.calls = 0;
        self.calls_before_qsy = rng.between(3, 10);
        self.resume = Deadline::Unscheduled;
    }
}
