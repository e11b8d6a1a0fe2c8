//! Finite-difference refinement of embedded constants.

use symreg_core::OptimizerConfig;
use symreg_ir::{Expression, Scalar};

/// Newton-style constant optimizer.
///
/// Each pass estimates, for every constant independently, the step that
/// would drive the cost to zero, then applies all steps at once. There is
/// no step control: a flat or noisy cost can send a constant to NaN or
/// infinity, which only makes that candidate lose selection.
#[derive(Debug, Clone)]
pub struct ConstantOptimizer {
    config: OptimizerConfig,
}

impl ConstantOptimizer {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Refine the constants of `expr` in place against `cost`
    pub fn optimize<F>(&self, expr: &mut Expression, cost: F)
    where
        F: Fn(&Expression) -> Scalar,
    {
        let slots = expr.constants();
        if slots.is_empty() {
            return;
        }

        let de = self.config.epsilon;
        let mut proposed = Vec::with_capacity(slots.len());
        for _ in 0..self.config.passes {
            proposed.clear();
            let s1 = cost(expr);
            for &slot in &slots {
                let v = expr.constant(slot);
                expr.set_constant(slot, v + de);
                let s2 = cost(expr);
                expr.set_constant(slot, v);
                proposed.push(v - s1 * de / (s2 - s1));
            }
            for (&slot, &v) in slots.iter().zip(&proposed) {
                expr.set_constant(slot, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SampleSet;
    use symreg_core::SamplingConfig;
    use symreg_ir::Opcode;

    #[test]
    fn test_linear_cost_solved_in_one_pass() {
        let optimizer = ConstantOptimizer::new(OptimizerConfig {
            passes: 1,
            ..Default::default()
        });
        let mut e = Expression::fallback();
        optimizer.optimize(&mut e, |e| 10.0 - e.eval(&[]));
        assert!((e.eval(&[]) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_updates_are_simultaneous() {
        // Both constants are fitted against the same baseline, so each one
        // absorbs the full residual on its own.
        let optimizer = ConstantOptimizer::new(OptimizerConfig {
            passes: 1,
            ..Default::default()
        });
        let mut e = Expression::new();
        e.push_constant(1.0);
        e.push(Opcode::Add);
        e.push_constant(1.0);
        e.push(Opcode::End);
        e.push(Opcode::End);

        optimizer.optimize(&mut e, |e| 5.0 - e.eval(&[]));

        let slots = e.constants();
        assert!((e.constant(slots[0]) - 4.0).abs() < 1e-6);
        assert!((e.constant(slots[1]) - 4.0).abs() < 1e-6);
        assert!(e.is_coherent());
    }

    #[test]
    fn test_fits_offset_against_samples() {
        let samples =
            SampleSet::new(&|args: &[f64]| args[0] + 3.0, &SamplingConfig::default(), 1).unwrap();
        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::Add);
        e.push_constant(0.0);
        e.push(Opcode::End);
        e.push(Opcode::End);

        let before = samples.cost(&e);
        ConstantOptimizer::new(OptimizerConfig::default()).optimize(&mut e, |e| samples.cost(e));
        let after = samples.cost(&e);

        assert!(after < before);
        assert!(after < 1e-3);
    }

    #[test]
    fn test_no_constants_is_noop() {
        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::Sin);
        e.push(Opcode::End);
        let snapshot = e.clone();

        ConstantOptimizer::new(OptimizerConfig::default()).optimize(&mut e, |_| 1.0);
        assert_eq!(e, snapshot);
    }

    #[test]
    fn test_flat_cost_is_not_guarded() {
        let mut e = Expression::fallback();
        ConstantOptimizer::new(OptimizerConfig::default()).optimize(&mut e, |_| 1.0);
        assert!(!e.eval(&[]).is_finite());
        assert!(e.is_coherent());
    }
}
