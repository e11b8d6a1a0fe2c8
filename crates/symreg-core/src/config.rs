//! Configuration types for the search.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Largest argument count addressable by the 8-bit argument index.
pub const MAX_ARG_COUNT: usize = u8::MAX as usize + 1;

/// Largest sample grid a solver will build
pub const MAX_SAMPLES: usize = 1 << 22;

/// Sampling domain used by the cost function
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Samples are taken over `[-half_width, half_width)` on every argument
    pub half_width: f64,
    /// Distance between consecutive samples
    pub step: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            half_width: 10.0,
            step: 0.1,
        }
    }
}

impl SamplingConfig {
    /// Number of samples along a single argument axis.
    ///
    /// Fails when the axis alone would exceed [`MAX_SAMPLES`].
    pub fn points_per_axis(&self) -> Result<usize> {
        let estimate = (2.0 * self.half_width / self.step).ceil();
        if !(estimate.is_finite() && estimate >= 0.0 && estimate <= MAX_SAMPLES as f64) {
            return Err(Error::Config(format!(
                "sampling width {} at step {} exceeds {} samples per axis",
                2.0 * self.half_width,
                self.step,
                MAX_SAMPLES
            )));
        }

        // The division can round either way; settle on the first index at
        // or past the upper bound.
        let at = |n: usize| -self.half_width + n as f64 * self.step;
        let mut n = estimate as usize;
        while n > 0 && at(n - 1) >= self.half_width {
            n -= 1;
        }
        while at(n) < self.half_width {
            n += 1;
        }
        Ok(n)
    }
}

/// Finite-difference constant optimizer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Number of Newton passes over all constants
    pub passes: usize,
    /// Perturbation used for the finite difference
    pub epsilon: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            passes: 4,
            epsilon: 1e-7,
        }
    }
}

/// Structural mutation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Fresh constants are drawn uniformly from `(-constant_range, constant_range)`
    pub constant_range: f64,
    /// Add the favorite's node count to the `max_mut` site budget
    pub scale_with_favorite: bool,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            constant_range: 10.0,
            scale_with_favorite: false,
        }
    }
}

/// Evolution driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Number of arguments the model takes
    pub arg_count: usize,
    /// Number of mutants bred per generation (pool size is `1 + gen_size`)
    pub gen_size: usize,
    /// Upper bound on shuffle rounds applied to one mutant, and on the
    /// mutation sites drawn in each round
    pub max_mut: usize,
    /// Generation cap
    pub max_generations: usize,
    /// Raw cost under which the search stops
    pub epsilon: f64,
    /// Cost added per node of the candidate
    pub parsimony_weight: f64,
    pub sampling: SamplingConfig,
    pub optimizer: OptimizerConfig,
    pub mutation: MutationConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            arg_count: 1,
            gen_size: 100,
            max_mut: 5,
            max_generations: 1000,
            epsilon: 1e-8,
            parsimony_weight: 0.001,
            sampling: SamplingConfig::default(),
            optimizer: OptimizerConfig::default(),
            mutation: MutationConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Load a configuration from a JSON file; absent fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: SolverConfig = serde_json::from_str(&text)?;
        config.validate()?;
        debug!("Loaded solver config from {}", path.display());
        Ok(config)
    }

    /// Reject configurations the search cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.arg_count > MAX_ARG_COUNT {
            return Err(Error::Config(format!(
                "arg_count {} exceeds the {} addressable arguments",
                self.arg_count, MAX_ARG_COUNT
            )));
        }
        if self.gen_size == 0 {
            return Err(Error::Config("gen_size must be at least 1".to_string()));
        }
        if self.max_mut == 0 {
            return Err(Error::Config("max_mut must be at least 1".to_string()));
        }
        if !(self.mutation.constant_range.is_finite() && self.mutation.constant_range > 0.0) {
            return Err(Error::Config(format!(
                "mutation.constant_range must be positive, got {}",
                self.mutation.constant_range
            )));
        }
        if !(self.sampling.step.is_finite() && self.sampling.step > 0.0) {
            return Err(Error::Config(format!(
                "sampling.step must be positive, got {}",
                self.sampling.step
            )));
        }
        if !(self.sampling.half_width.is_finite() && self.sampling.half_width > 0.0) {
            return Err(Error::Config(format!(
                "sampling.half_width must be positive, got {}",
                self.sampling.half_width
            )));
        }
        self.sampling.points_per_axis()?;
        if self.optimizer.epsilon == 0.0 || !self.optimizer.epsilon.is_finite() {
            return Err(Error::Config(format!(
                "optimizer.epsilon must be finite and non-zero, got {}",
                self.optimizer.epsilon
            )));
        }
        if self.parsimony_weight < 0.0 || self.parsimony_weight.is_nan() {
            return Err(Error::Config(format!(
                "parsimony_weight must not be negative, got {}",
                self.parsimony_weight
            )));
        }
        Ok(())
    }

    /// Number of slots in the evolution pool
    pub fn pool_size(&self) -> usize {
        1 + self.gen_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_configs() {
        let config = SolverConfig::default();
        assert_eq!(config.arg_count, 1);
        assert_eq!(config.pool_size(), 101);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.optimizer.passes, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_points_per_axis() {
        assert_eq!(SamplingConfig::default().points_per_axis().unwrap(), 200);

        let coarse = SamplingConfig {
            half_width: 1.0,
            step: 0.5,
        };
        assert_eq!(coarse.points_per_axis().unwrap(), 4);

        let uneven = SamplingConfig {
            half_width: 1.0,
            step: 0.3,
        };
        // -1.0, -0.7, -0.4, -0.1, 0.2, 0.5, 0.8
        assert_eq!(uneven.points_per_axis().unwrap(), 7);
    }

    #[test]
    fn test_oversized_axis_is_rejected() {
        let huge = SamplingConfig {
            half_width: 1e6,
            step: 1e-9,
        };
        assert!(matches!(huge.points_per_axis(), Err(Error::Config(_))));

        let config = SolverConfig {
            sampling: huge,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SolverConfig {
            gen_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SolverConfig {
            arg_count: 257,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let mut config = SolverConfig::default();
        config.sampling.step = 0.0;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::default();
        config.optimizer.epsilon = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_partial_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "gen_size": 20, "sampling": {{ "step": 0.5 }} }}"#).unwrap();

        let config = SolverConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.gen_size, 20);
        assert_eq!(config.sampling.step, 0.5);
        assert_eq!(config.sampling.half_width, 10.0);
        assert_eq!(config.max_mut, 5);
    }

    #[test]
    fn test_json_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_mut": 0 }}"#).unwrap();

        assert!(matches!(
            SolverConfig::from_json_file(file.path()),
            Err(Error::Config(_))
        ));
    }
}
