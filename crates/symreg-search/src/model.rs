//! Target models and the sampled cost function.

use symreg_core::{Error, Result, RunningMean, SamplingConfig, MAX_SAMPLES};
use symreg_ir::{Expression, Scalar};

/// A pure target function of a fixed number of scalar arguments
pub trait Model {
    fn evaluate(&self, args: &[Scalar]) -> Scalar;
}

impl<F> Model for F
where
    F: Fn(&[Scalar]) -> Scalar,
{
    fn evaluate(&self, args: &[Scalar]) -> Scalar {
        self(args)
    }
}

/// Sample points over the domain together with the model's value at each.
///
/// The model is pure, so it is evaluated once per point up front.
#[derive(Debug, Clone)]
pub struct SampleSet {
    arg_count: usize,
    /// Flattened points, `arg_count` values each
    points: Vec<Scalar>,
    targets: Vec<Scalar>,
}

impl SampleSet {
    /// Cartesian grid of `sampling` over every argument
    pub fn new<M: Model + ?Sized>(
        model: &M,
        sampling: &SamplingConfig,
        arg_count: usize,
    ) -> Result<Self> {
        let axis: Vec<Scalar> = (0..sampling.points_per_axis()?)
            .map(|i| -sampling.half_width + i as Scalar * sampling.step)
            .collect();

        let total = u32::try_from(arg_count)
            .ok()
            .and_then(|exp| axis.len().checked_pow(exp))
            .filter(|&n| n <= MAX_SAMPLES)
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} points per axis over {} arguments exceeds {} samples",
                    axis.len(),
                    arg_count,
                    MAX_SAMPLES
                ))
            })?;

        let mut points = Vec::with_capacity(total * arg_count);
        let mut targets = Vec::with_capacity(total);
        let mut args = vec![0.0; arg_count];
        for index in 0..total {
            let mut rest = index;
            for arg in args.iter_mut().rev() {
                *arg = axis[rest % axis.len()];
                rest /= axis.len();
            }
            points.extend_from_slice(&args);
            targets.push(model.evaluate(&args));
        }

        Ok(Self {
            arg_count,
            points,
            targets,
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Arguments of the `index`th sample
    pub fn point(&self, index: usize) -> &[Scalar] {
        &self.points[index * self.arg_count..(index + 1) * self.arg_count]
    }

    /// Mean absolute error between `expr` and the model over all samples.
    ///
    /// NaN and infinite values propagate into the result.
    pub fn cost(&self, expr: &Expression) -> Scalar {
        let mut mean = RunningMean::new();
        for (index, target) in self.targets.iter().enumerate() {
            mean.push((expr.eval(self.point(index)) - target).abs());
        }
        mean.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symreg_ir::Opcode;

    fn identity() -> Expression {
        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::End);
        e
    }

    #[test]
    fn test_default_grid() {
        let samples = SampleSet::new(&|args: &[f64]| args[0], &SamplingConfig::default(), 1).unwrap();
        assert_eq!(samples.len(), 200);
        assert_eq!(samples.point(0), &[-10.0]);
        assert!((samples.point(199)[0] - 9.9).abs() < 1e-9);
    }

    #[test]
    fn test_exact_fit_costs_nothing() {
        let samples = SampleSet::new(&|args: &[f64]| args[0], &SamplingConfig::default(), 1).unwrap();
        assert_eq!(samples.cost(&identity()), 0.0);
    }

    #[test]
    fn test_mean_absolute_error() {
        let samples = SampleSet::new(&|args: &[f64]| args[0], &SamplingConfig::default(), 1).unwrap();
        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::Add);
        e.push_constant(2.0);
        e.push(Opcode::End);
        e.push(Opcode::End);
        assert!((samples.cost(&e) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_nan_propagates() {
        let samples = SampleSet::new(&|args: &[f64]| args[0], &SamplingConfig::default(), 1).unwrap();
        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::Log);
        e.push(Opcode::End);
        assert!(samples.cost(&e).is_nan());
    }

    #[test]
    fn test_two_argument_grid() {
        let sampling = SamplingConfig {
            half_width: 1.0,
            step: 0.5,
        };
        let samples = SampleSet::new(&|args: &[f64]| args[0] * args[1], &sampling, 2).unwrap();
        assert_eq!(samples.len(), 16);
        assert_eq!(samples.point(0), &[-1.0, -1.0]);
        assert_eq!(samples.point(1), &[-1.0, -0.5]);
        assert_eq!(samples.point(4), &[-0.5, -1.0]);
    }

    #[test]
    fn test_no_arguments() {
        let samples = SampleSet::new(&|_: &[f64]| 3.0, &SamplingConfig::default(), 0).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples.cost(&Expression::fallback()), 3.0);
    }

    #[test]
    fn test_grid_too_large() {
        let result = SampleSet::new(&|_: &[f64]| 0.0, &SamplingConfig::default(), 4);
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_axis_fails_fast() {
        let sampling = SamplingConfig {
            half_width: 1e6,
            step: 1e-9,
        };
        let result = SampleSet::new(&|args: &[f64]| args[0], &sampling, 1);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
