//! Evolutionary search for closed-form expressions.
//!
//! A fixed pool of candidates is bred from the current favorite every
//! generation. Each mutant has its constants refined by finite differences
//! before it is scored against the target model.

pub mod model;
pub mod optimizer;
pub mod solver;

pub use model::{Model, SampleSet};
pub use optimizer::ConstantOptimizer;
pub use solver::{Solution, Solver};
