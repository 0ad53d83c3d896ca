//! `AD9833` Waveform Generator Driver
//!
//! Each chip has two 28-bit frequency registers and a control register,
//! written as 16-bit big-endian words while FSYNC is low. The four chips
//! share one SPI bus (mode 2) and have separate chip selects, so the
//! driver owns only its chip select and borrows the bus per call.
//!
//! Word encoding is plain arithmetic and is available on the host; the
//! bus driver itself needs the `embedded` feature.

use crate::generator::{tuning_word, GeneratorCommand};
use crate::types::Channel;

/// Register selection and control bits
mod reg {
    pub const CONTROL: u16 = 0x0000;
    pub const FREQ0: u16 = 0x4000;
    pub const FREQ1: u16 = 0x8000;
    pub const B28: u16 = 0x2000;
    pub const FSELECT: u16 = 0x0800;
    pub const RESET: u16 = 0x0100;
    pub const DATA_MASK: u16 = 0x3FFF;
}

/// Control word: sine output, 28-bit writes, `channel` selected
#[must_use]
pub const fn control_word(channel: Channel, reset: bool) -> u16 {
    let mut word = reg::CONTROL | reg::B28;
    if matches!(channel, Channel::Alt) {
        word |= reg::FSELECT;
    }
    if reset {
        word |= reg::RESET;
    }
    word
}

/// LSB then MSB words loading `tuning` into `channel`'s register
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn frequency_words(channel: Channel, tuning: u32) -> [u16; 2] {
    let select = match channel {
        Channel::Main => reg::FREQ0,
        Channel::Alt => reg::FREQ1,
    };
    let lsb = (tuning as u16) & reg::DATA_MASK;
    let msb = ((tuning >> 14) as u16) & reg::DATA_MASK;
    [select | lsb, select | msb]
}

/// Words for one queued generator command
///
/// Returns the buffer and how many words of it to send.
#[must_use]
pub fn command_words(command: GeneratorCommand, mclk_hz: u32) -> ([u16; 2], usize) {
    match command {
        GeneratorCommand::SetFrequency { channel, hz } => (frequency_words(channel, tuning_word(hz, mclk_hz)), 2),
        GeneratorCommand::Select(channel) => ([control_word(channel, false), 0], 1),
    }
}

#[cfg(feature = "embedded")]
pub use bus::{Ad9833, Ad9833Error};

#[cfg(feature = "embedded")]
mod bus {
    use super::{command_words, control_word};
    use crate::generator::GeneratorCommand;
    use crate::types::Channel;
    use embedded_hal::digital::OutputPin;
    use embedded_hal_async::spi::SpiBus;

    /// Driver failure
    #[derive(Clone, Copy, Debug, PartialEq, Eq, defmt::Format)]
    pub enum Ad9833Error {
        /// SPI transfer failed
        Bus,
        /// Chip select could not be driven
        Pin,
    }

    /// One `AD9833` behind a dedicated chip select
    pub struct Ad9833<CS> {
        cs: CS,
        mclk_hz: u32,
    }

    impl<CS: OutputPin> Ad9833<CS> {
        /// Driver for a chip clocked at `mclk_hz`
        pub const fn new(cs: CS, mclk_hz: u32) -> Self {
            Self { cs, mclk_hz }
        }

        async fn write<SPI: SpiBus>(&mut self, spi: &mut SPI, word: u16) -> Result<(), Ad9833Error> {
            self.cs.set_low().map_err(|_| Ad9833Error::Pin)?;
            let sent = spi.write(&word.to_be_bytes()).await;
            let flushed = spi.flush().await;
            self.cs.set_high().map_err(|_| Ad9833Error::Pin)?;
            sent.and(flushed).map_err(|_| Ad9833Error::Bus)
        }

        /// Reset the chip and leave it silent on channel 0
        pub async fn init<SPI: SpiBus>(&mut self, spi: &mut SPI) -> Result<(), Ad9833Error> {
            self.cs.set_high().map_err(|_| Ad9833Error::Pin)?;
            self.write(spi, control_word(Channel::Main, true)).await?;
            self.write(spi, control_word(Channel::Main, false)).await
        }

        /// Send one queued generator command
        pub async fn apply<SPI: SpiBus>(&mut self, spi: &mut SPI, command: GeneratorCommand) -> Result<(), Ad9833Error> {
            let (words, count) = command_words(command, self.mclk_hz);
            for &word in &words[..count] {
                self.write(spi, word).await?;
            }
            Ok(())
        }
    }
}
