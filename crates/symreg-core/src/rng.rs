//! Randomness source contract.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Uniform random draws used by the mutator and the solver.
///
/// Only `next_uint` is required; the floating-point draws are derived from it
/// so every implementation agrees on how raw bits map to values.
pub trait RandomSource {
    /// Uniform over the full `u64` range
    fn next_uint(&mut self) -> u64;

    /// Uniform in `[0, 1)`
    fn next_unit(&mut self) -> f64 {
        (self.next_uint() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform in `(-1, 1)`
    fn next_signed(&mut self) -> f64 {
        loop {
            let z = self.next_unit();
            if z != 0.0 {
                return (z - 0.5) * 2.0;
            }
        }
    }

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    fn below(&mut self, n: usize) -> usize {
        (self.next_uint() % n as u64) as usize
    }
}

impl<R: RngCore + ?Sized> RandomSource for R {
    fn next_uint(&mut self) -> u64 {
        self.next_u64()
    }
}

/// Deterministic generator for a given seed
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Seed derived from the wall clock, for runs without an explicit seed
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
