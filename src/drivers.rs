//! Peripheral Drivers
//!
//! Drivers for the external tone generator ICs and the tuning knob.

pub mod ad9833;
pub mod encoder;
