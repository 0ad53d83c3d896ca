//! Morse (CW) Keying Machine
//!
//! Sends a text message as timed dits and dahs. Timing follows the usual
//! unit accounting: dit 1, dah 3, element gap 1, character gap 3 and word
//! gap 7 (the longer gaps are counted as extra units after the element gap).
//!
//! # Encoding
//!
//! Each table entry packs a character into one byte. The lowest set bit
//! above bit 0 is a start marker; the bits above it are the elements in
//! sending order, 1 for dah and 0 for dit.

use super::{load_message, CarrierEdge, MessageBuffer, Modulator};
use crate::rng::Rng;
use crate::types::{Deadline, Millis, SimError, Transition};

/// Element durations in timing units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    /// Dit (1 unit)
    Dit,
    /// Dah (3 units)
    Dah,
    /// Inter-element gap (1 unit)
    ElementGap,
    /// Inter-character gap (3 units, 2 additional after element gap)
    CharGap,
    /// Inter-word gap (7 units, 6 additional after element gap)
    WordGap,
}

impl Element {
    /// Duration in timing units
    #[must_use]
    pub const fn units(self) -> u32 {
        match self {
            Self::Dit | Self::ElementGap => 1,
            Self::Dah => 3,
            Self::CharGap => 2,
            Self::WordGap => 6,
        }
    }

    /// Gaps between characters get the looser timing tolerance
    const fn is_spacing(self) -> bool {
        matches!(self, Self::CharGap | Self::WordGap)
    }
}

/// A-Z followed by 0-9
const MORSE_TABLE: [u8; 36] = [
    0b1010_0000, // A .-
    0b0001_1000, // B -...
    0b0101_1000, // C -.-.
    0b0011_0000, // D -..
    0b0100_0000, // E .
    0b0100_1000, // F ..-.
    0b0111_0000, // G --.
    0b0000_1000, // H ....
    0b0010_0000, // I ..
    0b1110_1000, // J .---
    0b1011_0000, // K -.-
    0b0010_1000, // L .-..
    0b1110_0000, // M --
    0b0110_0000, // N -.
    0b1111_0000, // O ---
    0b0110_1000, // P .--.
    0b1011_1000, // Q --.-
    0b0101_0000, // R .-.
    0b0001_0000, // S ...
    0b1100_0000, // T -
    0b1001_0000, // U ..-
    0b1000_1000, // V ...-
    0b1101_0000, // W .--
    0b1001_1000, // X -..-
    0b1101_1000, // Y -.--
    0b0011_1000, // Z --..
    0b1111_1100, // 0 -----
    0b1111_0100, // 1 .----
    0b1110_0100, // 2 ..---
    0b1100_0100, // 3 ...--
    0b1000_0100, // 4 ....-
    0b0000_0100, // 5 .....
    0b0000_1100, // 6 -....
    0b0001_1100, // 7 --...
    0b0011_1100, // 8 ---..
    0b0111_1100, // 9 ----.
];

/// Decoded character: element bits (LSB first) and element count
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Glyph {
    bits: u8,
    len: u8,
}

impl Glyph {
    /// Number of elements
    #[must_use]
    pub const fn len(self) -> u8 {
        self.len
    }

    /// True for a glyph with no elements
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Element at position `i`
    #[must_use]
    pub const fn element(self, i: u8) -> Element {
        if (self.bits >> i) & 1 == 1 {
            Element::Dah
        } else {
            Element::Dit
        }
    }
}

/// Look up a character; anything outside A-Z/0-9 sends as the first table entry
#[must_use]
pub fn glyph_for(c: u8) -> Glyph {
    let index = match c.to_ascii_uppercase() {
        c @ b'A'..=b'Z' => usize::from(c - b'A'),
        c @ b'0'..=b'9' => 26 + usize::from(c - b'0'),
        _ => 0,
    };
    decode(MORSE_TABLE[index])
}

fn decode(code: u8) -> Glyph {
    let mut bits = code;
    for shifts in 0..7u8 {
        bits >>= 1;
        if bits & 1 == 1 {
            return Glyph {
                bits: bits >> 1,
                len: 6 - shifts,
            };
        }
    }
    Glyph::default()
}

/// What happens when the current gap runs out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GapEnd {
    NextChar,
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Done,
    Char,
    Gap(GapEnd),
}

/// Morse keying machine
#[derive(Clone, Debug)]
pub struct Morse {
    text: MessageBuffer,
    pos: usize,
    glyph: Glyph,
    element: u8,
    key_down: bool,
    phase: Phase,
    deadline: Deadline,
    unit_ms: u32,
    fist: u8,
    just_completed: bool,
    edge: CarrierEdge,
    rng: Rng,
}

impl Morse {
    /// Milliseconds per unit at 1 WPM
    const MS_PER_UNIT_AT_1WPM: u32 = 1000;

    /// Idle machine with a perfect fist
    #[must_use]
    pub fn new(seed: u32) -> Self {
        Self {
            text: MessageBuffer::new(),
            pos: 0,
            glyph: Glyph::default(),
            element: 0,
            key_down: false,
            phase: Phase::Done,
            deadline: Deadline::Unscheduled,
            unit_ms: Self::MS_PER_UNIT_AT_1WPM / 20,
            fist: 0,
            just_completed: false,
            edge: CarrierEdge::default(),
            rng: Rng::new(seed),
        }
    }

    /// Builder-style fist quality
    #[must_use]
    pub fn with_fist(mut self, quality: u8) -> Self {
        self.fist = quality;
        self
    }

    /// Timing sloppiness, 0 (machine-perfect) to 255
    pub fn set_fist_quality(&mut self, quality: u8) {
        self.fist = quality;
    }

    /// Current fist quality
    #[must_use]
    pub const fn fist_quality(&self) -> u8 {
        self.fist
    }

    /// Milliseconds per timing unit
    #[must_use]
    pub const fn unit_ms(&self) -> u32 {
        self.unit_ms
    }

    /// Begin sending `text` at `wpm`
    ///
    /// Text longer than the message buffer is truncated and still sent.
    /// Leading spaces are skipped; an empty message completes on the
    /// next step.
    ///
    /// # Errors
    ///
    /// [`SimError::MessageTooLong`] if the text was truncated.
    pub fn start(&mut self, text: &str, wpm: u8) -> Result<(), SimError> {
        let loaded = load_message(&mut self.text, text);
        self.unit_ms = Self::MS_PER_UNIT_AT_1WPM / u32::from(wpm.max(1));
        self.deadline = Deadline::Unscheduled;
        self.key_down = false;
        self.just_completed = false;
        self.edge.reset();
        self.pos = self.skip_spaces(0);
        if self.pos < self.text.len() {
            self.load_char();
            self.phase = Phase::Char;
        } else {
            self.phase = Phase::Done;
            self.just_completed = true;
        }
        loaded
    }

    fn skip_spaces(&self, mut pos: usize) -> usize {
        while pos < self.text.len() && self.text[pos] == b' ' {
            pos += 1;
        }
        pos
    }

    fn load_char(&mut self) {
        self.glyph = glyph_for(self.text[self.pos]);
        self.element = 0;
    }

    /// Duration of an element including fist jitter
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn duration(&mut self, element: Element) -> u32 {
        let base = element.units() * self.unit_ms;
        if self.fist == 0 {
            return base;
        }
        let sloppiness = (u32::from(self.fist) * 3 / 255).min(2);
        let percent = if element.is_spacing() {
            (sloppiness + 1).min(3)
        } else {
            sloppiness
        };
        if percent == 0 {
            return base;
        }
        let offset = self.rng.spread(percent as i32);
        let base = i64::from(base);
        let scaled = base * i64::from(100 + offset) / 100;
        scaled.clamp(base * 80 / 100, base * 120 / 100) as u32
    }

    fn step_char(&mut self, now: Millis) {
        if self.deadline.is_scheduled() && !self.deadline.is_due(now) {
            return;
        }
        if self.key_down {
            self.key_down = false;
            let gap = self.duration(Element::ElementGap);
            self.deadline = Deadline::after(now, gap);
            return;
        }
        if self.element < self.glyph.len() {
            let element = self.glyph.element(self.element);
            self.element += 1;
            self.key_down = true;
            let on = self.duration(element);
            self.deadline = Deadline::after(now, on);
            return;
        }
        self.next_char(now);
    }

    fn next_char(&mut self, now: Millis) {
        let after = self.pos + 1;
        self.pos = self.skip_spaces(after);
        let gap = if self.pos > after {
            Element::WordGap
        } else {
            Element::CharGap
        };
        let extra = self.duration(gap);
        self.deadline = Deadline::after(now, extra);
        if self.pos < self.text.len() {
            self.load_char();
            self.phase = Phase::Gap(GapEnd::NextChar);
        } else {
            self.phase = Phase::Gap(GapEnd::Complete);
        }
    }
}

impl Modulator for Morse {
    fn step(&mut self, now: Millis) -> Transition {
        match self.phase {
            Phase::Done => {}
            Phase::Char => self.step_char(now),
            Phase::Gap(end) => {
                if self.deadline.is_due(now) {
                    match end {
                        GapEnd::NextChar => {
                            self.phase = Phase::Char;
                            self.step_char(now);
                        }
                        GapEnd::Complete => {
                            self.phase = Phase::Done;
                            self.just_completed = true;
                        }
                    }
                }
            }
        }

        if self.just_completed {
            self.just_completed = false;
            self.edge.report(false);
            return Transition::MessageComplete;
        }
        self.edge.report(self.key_down)
    }

    fn is_complete(&self) -> bool {
        self.phase == Phase::Done && !self.just_completed
    }
}
