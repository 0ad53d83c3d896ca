//! Keying Protocols
//!
//! Time-driven modulators that turn text or parameters into carrier
//! transitions. Each machine is advanced with the current time and answers
//! with a [`Transition`]; the owning station maps that onto a generator.
//!
//! - [`morse`] - CW with fist jitter
//! - [`teleprinter`] - 5-bit Baudot frames (RTTY)
//! - [`pager`] - two-tone sequential paging
//! - [`jammer`] - drifting carrier with random mutes

pub mod jammer;
pub mod morse;
pub mod pager;
pub mod teleprinter;

pub use jammer::{BrownianDrift, Jammer, JammerTiming};
pub use morse::Morse;
pub use pager::{Pager, PagerPhase, PagerTiming};
pub use teleprinter::{Teleprinter, TeleprinterTiming};

use crate::config::MESSAGE_CAPACITY;
use crate::types::{Millis, SimError, Transition};
use heapless::Vec;

/// Common contract of every keying machine
pub trait Modulator {
    /// Advance to `now` and report what the carrier did
    fn step(&mut self, now: Millis) -> Transition;

    /// True once a non-repeating transmission has ended
    fn is_complete(&self) -> bool;
}

/// Bounded copy of protocol text
pub(crate) type MessageBuffer = Vec<u8, MESSAGE_CAPACITY>;

/// Copy `text` into a message buffer, truncating at capacity
pub(crate) fn load_message(buffer: &mut MessageBuffer, text: &str) -> Result<(), SimError> {
    buffer.clear();
    let bytes = text.as_bytes();
    let fits = bytes.len().min(MESSAGE_CAPACITY);
    // Capacity was just checked, so this cannot fail.
    let _ = buffer.extend_from_slice(&bytes[..fits]);
    if fits < bytes.len() {
        warn!("message truncated to {} bytes", MESSAGE_CAPACITY);
        Err(SimError::MessageTooLong)
    } else {
        Ok(())
    }
}

/// Carrier edge bookkeeping shared by the machines
///
/// Compares the requested level with what was last reported.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct CarrierEdge {
    switched_on: bool,
}

impl CarrierEdge {
    pub(crate) fn report(&mut self, on: bool) -> Transition {
        let transition = Transition::from_levels(self.switched_on, on);
        self.switched_on = on;
        transition
    }

    pub(crate) fn is_on(self) -> bool {
        self.switched_on
    }

    pub(crate) fn reset(&mut self) {
        self.switched_on = false;
    }
}
