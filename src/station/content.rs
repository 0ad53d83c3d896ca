//! Message content for simulated operators
//!
//! Callsigns use a doubled digit (W55XYZ, K00AB) so they sound plausible
//! but cannot belong to a licensed station.

use crate::config::MESSAGE_CAPACITY;
use crate::rng::Rng;
use core::fmt::Write;
use heapless::String;

/// Fictional callsign
pub type Callsign = String<8>;

/// Composed protocol text
pub type Message = String<MESSAGE_CAPACITY>;

/// Five-digit cipher group or interval signal
pub type Group = String<8>;

const PREFIXES: [char; 3] = ['W', 'K', 'N'];

/// Random callsign of the form `[WKN]dd[A-Z]{2,3}`
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn random_callsign(rng: &mut Rng) -> Callsign {
    let mut call = Callsign::new();
    let prefix = PREFIXES[rng.below(3) as usize];
    let digit = char::from(b'0' + rng.below(10) as u8);
    let suffix_len = rng.between(2, 3);
    let _ = call.push(prefix);
    let _ = call.push(digit);
    let _ = call.push(digit);
    for _ in 0..suffix_len {
        let _ = call.push(char::from(b'A' + rng.below(26) as u8));
    }
    call
}

/// `CQ CQ DE <call> <call> K`
#[must_use]
pub fn cq_message(call: &str) -> Message {
    let mut msg = Message::new();
    let _ = write!(msg, "CQ CQ DE {call} {call} K");
    msg
}

/// `CQ CQ DE <call> K` for the teleprinter
#[must_use]
pub fn rtty_message(call: &str) -> Message {
    let mut msg = Message::new();
    let _ = write!(msg, "CQ CQ DE {call} K");
    msg
}

/// Numbers station interval signal
#[must_use]
pub fn interval_signal() -> Group {
    let mut group = Group::new();
    let _ = group.push_str("FT");
    group
}

/// Random five-digit group
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number_group(rng: &mut Rng) -> Group {
    let mut group = Group::new();
    for _ in 0..5 {
        let _ = group.push(char::from(b'0' + rng.below(10) as u8));
    }
    group
}

/// Numbers station end-of-message group
#[must_use]
pub fn ending_group() -> Group {
    let mut group = Group::new();
    let _ = group.push_str("00000");
    group
}
