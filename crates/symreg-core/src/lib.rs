//! Core types and utilities for the symbolic regression search.

pub mod config;
pub mod error;
pub mod fitness;
pub mod rng;

pub use error::{Error, Result};
pub use config::*;
pub use fitness::*;
pub use rng::{clock_seed, seeded_rng, RandomSource};
