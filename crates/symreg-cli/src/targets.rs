//! Built-in target functions.

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Target {
    /// f(x) = x
    Identity,
    /// f(x) = x * x
    Square,
    /// f(x) = x^3 - 2x
    Cubic,
    /// f(x) = 3 sin(x)
    Sine,
    /// f(x) = exp(-x^2 / 10)
    Gaussian,
    /// f(x, y) = x * y + y
    Product,
}

impl Target {
    pub fn arg_count(&self) -> usize {
        match self {
            Target::Product => 2,
            _ => 1,
        }
    }

    pub fn evaluate(&self, args: &[f64]) -> f64 {
        match self {
            Target::Identity => args[0],
            Target::Square => args[0] * args[0],
            Target::Cubic => args[0] * args[0] * args[0] - 2.0 * args[0],
            Target::Sine => 3.0 * args[0].sin(),
            Target::Gaussian => (-args[0] * args[0] / 10.0).exp(),
            Target::Product => args[0] * args[1] + args[1],
        }
    }
}
