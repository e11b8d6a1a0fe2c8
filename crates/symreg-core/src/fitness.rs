//! Fitness scores and per-generation statistics.

use serde::{Deserialize, Serialize};

/// Score of one candidate: sampled error plus the complexity penalty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fitness {
    /// Mean absolute error against the model
    pub raw: f64,
    /// `node_count * parsimony_weight`
    pub penalty: f64,
}

impl Fitness {
    pub fn new(raw: f64, node_count: usize, parsimony_weight: f64) -> Self {
        Self {
            raw,
            penalty: node_count as f64 * parsimony_weight,
        }
    }

    /// Unscored placeholder; never beats a real candidate
    pub fn worst() -> Self {
        Self {
            raw: f64::INFINITY,
            penalty: 0.0,
        }
    }

    /// The value selection ranks on
    pub fn full(&self) -> f64 {
        self.raw + self.penalty
    }

    /// Strictly better. NaN scores are never better than anything.
    pub fn beats(&self, other: &Fitness) -> bool {
        self.full() < other.full()
    }
}

/// Incremental mean, updated one observation at a time
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningMean {
    mean: f64,
    count: u64,
}

impl RunningMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        let n = self.count as f64;
        self.mean = (self.mean * n + value) / (n + 1.0);
        self.count += 1;
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Snapshot of the favorite at the end of a generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: Fitness,
    pub node_count: usize,
    /// A mutant displaced the previous favorite
    pub improved: bool,
}
