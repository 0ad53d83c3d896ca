//! Dual-channel tone generator shadow
//!
//! Each AD9833 has two frequency registers and a select line. The shadow
//! caches what the chip was last told and queues a command only when a
//! value actually changes; the hardware shell drains the queue over SPI.

use crate::config::SILENT_HZ;
use crate::types::Channel;
use fixed::types::U64F64;
use heapless::Deque;

/// Pending commands per generator before the queue collapses into a re-sync
const QUEUE_DEPTH: usize = 8;

/// Width of the AD9833 phase accumulator
const PHASE_BITS: u32 = 28;

/// One write the hardware shell must perform
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeneratorCommand {
    /// Load a frequency register
    SetFrequency {
        /// Target register
        channel: Channel,
        /// Output frequency (Hz)
        hz: f32,
    },
    /// Route a register to the output
    Select(Channel),
}

#[cfg(feature = "embedded")]
impl defmt::Format for GeneratorCommand {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SetFrequency { channel, hz } => defmt::write!(f, "SET {} {}Hz", channel, hz),
            Self::Select(channel) => defmt::write!(f, "SEL {}", channel),
        }
    }
}

/// Cached state of one generator chip
#[derive(Debug)]
pub struct Generator {
    frequencies: [f32; 2],
    selected: Channel,
    pending: Deque<GeneratorCommand, QUEUE_DEPTH>,
    resync: bool,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Fresh generator: both channels silent, main selected
    ///
    /// The chip state is unknown at power-up, so the first drain writes
    /// everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frequencies: [SILENT_HZ; 2],
            selected: Channel::Main,
            pending: Deque::new(),
            resync: true,
        }
    }

    /// Cached frequency of a channel
    #[must_use]
    pub fn frequency(&self, channel: Channel) -> f32 {
        self.frequencies[channel.index()]
    }

    /// Currently selected channel
    #[must_use]
    pub fn selected(&self) -> Channel {
        self.selected
    }

    /// Frequency currently routed to the output
    #[must_use]
    pub fn output(&self) -> f32 {
        self.frequency(self.selected)
    }

    /// True if the output is the silent frequency
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_silent(&self) -> bool {
        self.output() == SILENT_HZ
    }

    /// Set a channel's frequency; returns true if a write was queued
    #[allow(clippy::float_cmp)]
    pub fn set_frequency(&mut self, channel: Channel, hz: f32) -> bool {
        if self.frequencies[channel.index()] == hz {
            return false;
        }
        self.frequencies[channel.index()] = hz;
        self.queue(GeneratorCommand::SetFrequency { channel, hz });
        true
    }

    /// Route a channel to the output
    pub fn select(&mut self, channel: Channel) {
        if self.selected != channel {
            self.selected = channel;
            self.queue(GeneratorCommand::Select(channel));
        }
    }

    /// Write the silent frequency to both channels
    pub fn silence(&mut self) {
        self.set_frequency(Channel::Main, SILENT_HZ);
        self.set_frequency(Channel::Alt, SILENT_HZ);
    }

    /// Rewrite both channels and the select line on the next drain
    pub fn force_refresh(&mut self) {
        self.pending.clear();
        self.resync = true;
    }

    /// True if the shell has writes to perform
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.resync || !self.pending.is_empty()
    }

    /// Hand every pending write to `apply`, oldest first
    pub fn drain(&mut self, mut apply: impl FnMut(GeneratorCommand)) {
        if self.resync {
            self.resync = false;
            self.pending.clear();
            for channel in [Channel::Main, Channel::Alt] {
                apply(GeneratorCommand::SetFrequency {
                    channel,
                    hz: self.frequency(channel),
                });
            }
            apply(GeneratorCommand::Select(self.selected));
            return;
        }
        while let Some(command) = self.pending.pop_front() {
            apply(command);
        }
    }

    fn queue(&mut self, command: GeneratorCommand) {
        if self.resync {
            return;
        }
        if self.pending.push_back(command).is_err() {
            self.force_refresh();
        }
    }
}

/// AD9833 frequency register value for `hz` with master clock `mclk_hz`
///
/// `word = hz * 2^28 / mclk`, rounded. Negative or non-finite input gives 0;
/// anything above Nyquist is clamped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn tuning_word(hz: f32, mclk_hz: u32) -> u32 {
    if hz.is_nan() || hz <= 0.0 || mclk_hz == 0 {
        return 0;
    }
    let hz = hz.min(mclk_hz as f32 / 2.0);
    let scaled = U64F64::saturating_from_num(hz) << PHASE_BITS;
    let word = (scaled / U64F64::from_num(mclk_hz)).round();
    word.saturating_to_num::<u32>() & ((1 << PHASE_BITS) - 1)
}
