//! Simulated Radio Firmware Library
//!
//! This library populates a receiver's band with simulated transmitters.
//! A small bank of `AD9833` tone generators is shared among many stations
//! (CW operators, numbers stations, RTTY, pagers, a jammer); the engine
//! decides each millisecond which stations are near enough to the dial to
//! deserve a generator and what every generator should be playing.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   COMPOSITION LAYER                          │
//! │        SimRadio  │  StationManager  │  Scheduler             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     STATION LAYER                            │
//! │  CW  │  Numbers  │  RTTY  │  Pager  │  Jammer  │  Meter      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    PROTOCOL LAYER                            │
//! │     Morse  │  Baudot  │  Two-tone  │  Brownian drift         │
//! ├─────────────────────────────────────────────────────────────┤
//! │               GENERATOR / DRIVER LAYER                       │
//! │    Generator pool  │  Command queue  │  AD9833 over SPI      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: the engine only queues
//!   generator commands; the main loop performs the SPI writes
//! - **Type-driven design**: leases, deadlines and lifecycles are types
//! - **No unsafe in application code**
//! - **Bounded memory**: every buffer is a fixed-capacity `heapless` type
//! - **Explicit error handling**: fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// This must go first so the logging macros are visible to every module
#[macro_use]
mod fmt;

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Deterministic pseudo-random numbers for operator behaviour
pub mod rng;

/// Tone Generators
///
/// Per-chip state with a command queue, and the lease-based pool.
pub mod generator;

/// Peripheral Drivers
///
/// `AD9833` register encoding and the tuning knob decoder; the SPI
/// driver needs `embedded`.
pub mod drivers;

/// Keying Protocols
///
/// Morse, Baudot, two-tone paging and jammer drift machines.
pub mod protocol;

/// Signal-strength meter fed by carrier charge pulses
pub mod meter;

/// Simulated Stations
///
/// Station kinds and the shared begin/step/update/end lifecycle.
pub mod station;

/// Lifecycle and generator-slot management, with dial-following relocation
pub mod manager;

/// Per-tick station driver
pub mod scheduler;

/// The complete simulated band
pub mod sim;

pub use generator::{GeneratorCommand, GeneratorPool};
pub use sim::SimRadio;
pub use station::Station;
pub use types::{DialFrequency, Millis, SimError};

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::generator::GeneratorCommand;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::digital::OutputPin;
    pub use embedded_hal_async::spi::SpiBus;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
