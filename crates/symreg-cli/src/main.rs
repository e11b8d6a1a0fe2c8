//! Command line entry point for the expression search.

mod targets;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use symreg_core::{clock_seed, seeded_rng, SolverConfig};
use symreg_search::Solver;
use targets::Target;
use tracing::info;

/// Search for a closed-form expression approximating a target function
#[derive(Parser, Debug)]
#[command(name = "symreg")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Random seed (default: derived from the clock)
    seed: Option<u64>,

    /// Target function to fit
    #[arg(short, long, value_enum, default_value = "identity")]
    target: Target,

    /// JSON solver configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the generation cap
    #[arg(short, long)]
    generations: Option<usize>,

    /// Print the full solution as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    telemetry::init_telemetry(args.json)?;

    let mut config = match &args.config {
        Some(path) => SolverConfig::from_json_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SolverConfig::default(),
    };
    config.arg_count = args.target.arg_count();
    if let Some(generations) = args.generations {
        config.max_generations = generations;
    }

    let seed = args.seed.unwrap_or_else(clock_seed);
    info!("Fitting {:?} with seed {}", args.target, seed);

    let target = args.target;
    let mut solver = Solver::new(config, &|x: &[f64]| target.evaluate(x))?;
    let solution = solver.run(&mut seeded_rng(seed));

    println!("Seed: {}", seed);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&solution)?);
    } else {
        println!("Best: {}", solution.expression);
    }

    Ok(())
}
