//! Teleprinter (RTTY) Keying Machine
//!
//! 45.45 baud ITA2 framing: one start bit (space), five data bits sent
//! least significant first, then a 1.5-bit stop (mark). Carrier "on" is
//! mark and "off" is space; the owning station maps them onto the two
//! FSK tones.
//!
//! Digits are sent in figures shift. The machine inserts FIGS/LTRS frames
//! whenever the next character needs the other shift.

use super::{load_message, CarrierEdge, MessageBuffer, Modulator};
use crate::types::{Deadline, Millis, SimError, Transition};

/// ITA2 space, also sent for unsupported characters
pub const BAUDOT_SPACE: u8 = 0x04;

/// Idle line: all marks
const BAUDOT_IDLE: u8 = 0x1F;

/// ITA2 letters A-Z
const LETTERS: [u8; 26] = [
    0x03, 0x19, 0x0E, 0x09, 0x01, 0x0D, 0x1A, // A-G
    0x14, 0x06, 0x0B, 0x0F, 0x12, 0x1C, 0x0C, // H-N
    0x18, 0x16, 0x17, 0x0A, 0x05, 0x10, 0x07, // O-U
    0x1E, 0x13, 0x1D, 0x15, 0x11, // V-Z
];

/// ITA2 figures 0-9
const FIGURES: [u8; 10] = [0x16, 0x17, 0x13, 0x01, 0x0A, 0x10, 0x15, 0x07, 0x06, 0x18];

/// Character set the receiving machine is in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Shift {
    /// Letters (LTRS)
    #[default]
    Letters,
    /// Figures (FIGS)
    Figures,
}

impl Shift {
    /// Shift control code
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Letters => 0x1F,
            Self::Figures => 0x1B,
        }
    }
}

/// Baudot code for a character and the shift it needs, if any
#[must_use]
pub fn baudot(c: u8) -> (u8, Option<Shift>) {
    match c.to_ascii_uppercase() {
        c @ b'A'..=b'Z' => (LETTERS[usize::from(c - b'A')], Some(Shift::Letters)),
        c @ b'0'..=b'9' => (FIGURES[usize::from(c - b'0')], Some(Shift::Figures)),
        b'\r' => (0x08, None),
        b'\n' => (0x02, None),
        _ => (BAUDOT_SPACE, None),
    }
}

/// Bit timing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TeleprinterTiming {
    /// Start and data bit length (ms)
    pub bit_ms: u32,
    /// Stop bit length (ms)
    pub stop_ms: u32,
}

impl Default for TeleprinterTiming {
    fn default() -> Self {
        Self {
            bit_ms: 22,
            stop_ms: 33,
        }
    }
}

/// RTTY keying machine
#[derive(Clone, Debug, Default)]
pub struct Teleprinter {
    text: MessageBuffer,
    pos: usize,
    repeat: bool,
    running: bool,
    element: u8,
    code: u8,
    shift: Shift,
    shift_frame: bool,
    mark: bool,
    deadline: Deadline,
    timing: TeleprinterTiming,
    edge: CarrierEdge,
}

impl Teleprinter {
    /// Idle machine with the given bit timing
    #[must_use]
    pub fn new(timing: TeleprinterTiming) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    /// Begin sending `text`, looping forever if `repeat`
    ///
    /// # Errors
    ///
    /// [`SimError::MessageTooLong`] if the text was truncated.
    pub fn start(&mut self, text: &str, repeat: bool) -> Result<(), SimError> {
        let loaded = load_message(&mut self.text, text);
        self.pos = 0;
        self.repeat = repeat;
        self.running = true;
        self.element = 0;
        self.shift = Shift::Letters;
        self.shift_frame = false;
        self.mark = false;
        self.deadline = Deadline::Unscheduled;
        self.edge.reset();
        loaded
    }

    /// Characters sent so far in the current pass
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    fn frame_code(&mut self) -> u8 {
        let Some(&c) = self.text.get(self.pos) else {
            return BAUDOT_IDLE;
        };
        let (code, needs) = baudot(c);
        match needs {
            Some(shift) if shift != self.shift => {
                self.shift = shift;
                self.shift_frame = true;
                shift.code()
            }
            _ => code,
        }
    }

    /// Element 0 is the start bit, 1-5 data bits, 6 the stop bit
    fn step_element(&mut self, now: Millis) {
        match self.element {
            0 => {
                self.mark = false;
                self.deadline = Deadline::after(now, self.timing.bit_ms);
                self.element = 1;
            }
            1..=5 => {
                if self.element == 1 {
                    self.code = self.frame_code();
                }
                self.mark = (self.code >> (self.element - 1)) & 1 == 1;
                self.deadline = Deadline::after(now, self.timing.bit_ms);
                self.element += 1;
            }
            _ => {
                self.mark = true;
                self.deadline = Deadline::after(now, self.timing.stop_ms);
                self.element = 0;
                if self.shift_frame {
                    self.shift_frame = false;
                } else if self.pos < self.text.len() {
                    self.pos += 1;
                    if self.pos >= self.text.len() && self.repeat {
                        self.pos = 0;
                    }
                }
            }
        }
    }
}

impl Modulator for Teleprinter {
    fn step(&mut self, now: Millis) -> Transition {
        if !self.running {
            return self.edge.report(false);
        }
        if !self.deadline.is_scheduled() || self.deadline.is_due(now) {
            self.step_element(now);
        }
        self.edge.report(self.mark)
    }

    fn is_complete(&self) -> bool {
        self.pos >= self.text.len() && !self.repeat
    }
}
