//! System configuration and simulation constants
//!
//! Compile-time constants for the generator hardware and the band-activity
//! engine, plus the runtime [`SimConfig`] handed to stations, the scheduler
//! and the manager.

/// Lowest audio frequency a listener can hear through the receiver (Hz)
pub const MIN_AUDIBLE_HZ: f32 = 150.0;

/// Highest audio frequency passed by the receiver audio chain (Hz)
pub const MAX_AUDIBLE_HZ: f32 = 5000.0;

/// Frequency written to a channel that must produce no audible output (Hz)
pub const SILENT_HZ: f32 = 0.1;

/// Default beat-frequency oscillator offset (Hz)
pub const DEFAULT_AUDIO_OFFSET_HZ: i32 = 700;

/// Largest BFO offset the tuning front end will set (Hz)
pub const MAX_AUDIO_OFFSET_HZ: i32 = 2000;

/// Number of AD9833 tone generators on the board
pub const GENERATOR_COUNT: usize = 4;

/// Maximum number of simulated stations
pub const MAX_STATIONS: usize = 21;

/// Message buffer size for protocol text (bytes)
pub const MESSAGE_CAPACITY: usize = 40;

/// AD9833 master clock (25 MHz crystal)
pub const AD9833_MCLK_HZ: u32 = 25_000_000;

/// SPI clock for the generator bus
pub const GENERATOR_SPI_HZ: u32 = 4_000_000;

/// Main loop tick period (milliseconds)
pub const TICK_PERIOD_MS: u64 = 1;

/// Default startup dial frequency (40m CW segment)
pub const DEFAULT_DIAL_HZ: u32 = 7_002_000;

/// Lowest dial frequency the tuning knob reaches (Hz)
pub const DIAL_MIN_HZ: u32 = 100_000;

/// Highest dial frequency the tuning knob reaches (Hz)
pub const DIAL_MAX_HZ: u32 = 160_000_000;

/// Dial step per encoder detent (Hz)
pub const TUNING_STEP_HZ: u32 = 50;

/// Charge pulses are reported negated within this distance of zero beat (Hz)
pub const LOCK_WINDOW_HZ: f32 = 50.0;

/// Width of the band above the tuned audio window that produces meter charge (Hz)
pub const CHARGE_SPAN_HZ: f32 = 5000.0;

/// Peak charge pulse amplitude
pub const MAX_CHARGE: f32 = 2.0;

/// Pipelining parameters
pub mod pipeline {
    //! Defaults for dial-following station relocation.

    /// Stations within this distance of the dial are audible candidates (Hz)
    pub const AUDIBLE_RANGE_HZ: u32 = 5000;

    /// Stations within this distance are kept alive (Hz)
    pub const LOOKAHEAD_RANGE_HZ: u32 = 8000;

    /// Smallest dial movement counted as tuning (Hz)
    pub const TUNE_THRESHOLD_HZ: u32 = 100;

    /// Center shift that triggers a relocation pass (Hz)
    pub const RELOCATION_THRESHOLD_HZ: u32 = 3000;

    /// Minimum spacing between relocation passes (ms)
    pub const RELOCATION_INTERVAL_MS: u32 = 200;

    /// Dial considered stopped after this long without movement (ms)
    pub const SETTLE_TIMEOUT_MS: u32 = 5000;

    /// Relocated stations are never placed below this frequency (Hz)
    pub const MIN_RELOCATED_HZ: u32 = 100_000;

    /// First relocation slot ahead of an upward-tuning dial (Hz)
    pub const AHEAD_OFFSET_HZ: u32 = 2000;

    /// Spacing between relocation slots ahead of the dial (Hz)
    pub const AHEAD_SPACING_HZ: u32 = 1000;

    /// First relocation slot below a downward-tuning dial (Hz)
    pub const BEHIND_OFFSET_HZ: u32 = 5700;

    /// Spacing between relocation slots below the dial (Hz)
    pub const BEHIND_SPACING_HZ: u32 = 500;
}

/// Dial-following relocation settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Audible candidate range (Hz)
    pub audible_range_hz: u32,
    /// Lookahead range (Hz)
    pub lookahead_range_hz: u32,
    /// Tuning detection threshold (Hz)
    pub tune_threshold_hz: u32,
    /// Center shift that triggers relocation (Hz)
    pub relocation_threshold_hz: u32,
    /// Minimum interval between relocations (ms)
    pub relocation_interval_ms: u32,
    /// Tuning direction resets after this long without movement (ms)
    pub settle_timeout_ms: u32,
    /// Lower bound for relocated frequencies (Hz)
    pub min_relocated_hz: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            audible_range_hz: pipeline::AUDIBLE_RANGE_HZ,
            lookahead_range_hz: pipeline::LOOKAHEAD_RANGE_HZ,
            tune_threshold_hz: pipeline::TUNE_THRESHOLD_HZ,
            relocation_threshold_hz: pipeline::RELOCATION_THRESHOLD_HZ,
            relocation_interval_ms: pipeline::RELOCATION_INTERVAL_MS,
            settle_timeout_ms: pipeline::SETTLE_TIMEOUT_MS,
            min_relocated_hz: pipeline::MIN_RELOCATED_HZ,
        }
    }
}

/// Runtime configuration shared by every station
///
/// The audio offset belongs to the host's tuning front end; the engine only
/// reads it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimConfig {
    /// BFO offset added to every station's audio frequency (Hz)
    pub audio_offset_hz: i32,
    /// Lower edge of the audible window (Hz)
    pub min_audible_hz: f32,
    /// Upper edge of the audible window (Hz)
    pub max_audible_hz: f32,
    /// Zero-beat window for lock pulses (Hz)
    pub lock_window_hz: f32,
    /// Relocation settings
    pub pipeline: PipelineConfig,
}

impl SimConfig {
    /// True if `audio_hz` falls inside the audible window
    #[must_use]
    pub fn is_audible(&self, audio_hz: f32) -> bool {
        audio_hz >= self.min_audible_hz && audio_hz <= self.max_audible_hz
    }

    /// Builder-style audio offset override
    #[must_use]
    pub const fn with_audio_offset(mut self, hz: i32) -> Self {
        self.audio_offset_hz = hz;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            audio_offset_hz: DEFAULT_AUDIO_OFFSET_HZ,
            min_audible_hz: MIN_AUDIBLE_HZ,
            max_audible_hz: MAX_AUDIBLE_HZ,
            lock_window_hz: LOCK_WINDOW_HZ,
            pipeline: PipelineConfig::default(),
        }
    }
}

/// GPIO Pin Assignments
///
/// These match the generator daughterboard wiring.
pub mod pins {
    //! Pin mapping for STM32G474 to the AD9833 bank and tuning knob.
    //!
    //! All four generators share SPI1; each has its own chip select.

    /// SPI1 clock
    pub const GEN_SCK: &str = "PA5";
    /// SPI1 MOSI
    pub const GEN_MOSI: &str = "PA7";
    /// Chip select, generator 0
    pub const GEN_CS0: &str = "PB0";
    /// Chip select, generator 1
    pub const GEN_CS1: &str = "PB1";
    /// Chip select, generator 2
    pub const GEN_CS2: &str = "PB2";
    /// Chip select, generator 3
    pub const GEN_CS3: &str = "PB10";
    /// Tuning encoder, phase A
    pub const ENC_A: &str = "PA0";
    /// Tuning encoder, phase B
    pub const ENC_B: &str = "PA1";
    /// Status LED
    pub const LED_STATUS: &str = "PC6";
}

/// Get default dial frequency
#[must_use]
pub const fn default_dial() -> crate::types::DialFrequency {
    crate::types::DialFrequency::from_hz(DEFAULT_DIAL_HZ)
}
