//! Tone Generator Model
//!
//! Software shadow of the AD9833 bank and the lease pool that hands
//! generators to stations.

pub mod pool;
pub mod wavegen;

pub use pool::{GeneratorLease, GeneratorPool};
pub use wavegen::{tuning_word, Generator, GeneratorCommand};
