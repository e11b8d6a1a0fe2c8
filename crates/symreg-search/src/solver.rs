//! Generational evolution driver.

use crate::model::{Model, SampleSet};
use crate::optimizer::ConstantOptimizer;
use serde::Serialize;
use symreg_core::{Fitness, GenerationStats, RandomSource, Result, SolverConfig};
use symreg_ir::{Expression, Mutator, Scalar};
use tracing::{debug, info, instrument, trace};

/// Outcome of a search
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    /// Encoded bytes are private; the rendered text is what gets reported
    #[serde(serialize_with = "serialize_expression")]
    pub expression: Expression,
    pub fitness: Fitness,
    pub generations: usize,
    pub converged: bool,
    pub history: Vec<GenerationStats>,
}

fn serialize_expression<S: serde::Serializer>(
    expr: &Expression,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&expr.format())
}

pub struct Solver {
    config: SolverConfig,
    samples: SampleSet,
    mutator: Mutator,
    optimizer: ConstantOptimizer,
    pool: Vec<Expression>,
    scratch: Expression,
    favorite: usize,
}

impl Solver {
    pub fn new<M: Model + ?Sized>(config: SolverConfig, model: &M) -> Result<Self> {
        config.validate()?;
        let samples = SampleSet::new(model, &config.sampling, config.arg_count)?;
        let mutator = Mutator::new(config.mutation.clone(), config.arg_count);
        let optimizer = ConstantOptimizer::new(config.optimizer.clone());
        let pool = vec![Expression::new(); config.pool_size()];

        Ok(Self {
            config,
            samples,
            mutator,
            optimizer,
            pool,
            scratch: Expression::new(),
            favorite: 0,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Current favorite of the pool
    pub fn favorite(&self) -> &Expression {
        &self.pool[self.favorite]
    }

    /// Mean absolute error against the model
    pub fn cost(&self, expr: &Expression) -> Scalar {
        self.samples.cost(expr)
    }

    /// Error plus parsimony penalty
    pub fn fitness(&self, expr: &Expression) -> Fitness {
        Fitness::new(
            self.cost(expr),
            expr.node_count(),
            self.config.parsimony_weight,
        )
    }

    /// Run the search from the fallback expression
    #[instrument(skip(self, rng), fields(pool_size = self.pool.len(), max_generations = self.config.max_generations))]
    pub fn run<R: RandomSource + ?Sized>(&mut self, rng: &mut R) -> Solution {
        info!(
            "Starting search over {} samples with {} arguments",
            self.samples.len(),
            self.config.arg_count
        );

        for slot in &mut self.pool {
            slot.clear();
        }
        self.favorite = 0;
        self.pool[0].reset_to_fallback();

        let mut history = Vec::new();
        let mut best = Fitness::worst();
        let mut converged = false;

        for generation in 0..self.config.max_generations {
            let favorite = self.favorite;
            let sites = self.site_budget();
            let mut best_slot = favorite;
            let mut generation_best = Fitness::worst();
            let mut favorite_fitness = Fitness::worst();

            for i in 0..self.pool.len() {
                if i != favorite {
                    let (source, slot) = split_pair(&mut self.pool, favorite, i);
                    self.mutator.mutate(
                        source,
                        slot,
                        &mut self.scratch,
                        rng,
                        sites,
                        self.config.max_mut,
                    );
                    let samples = &self.samples;
                    self.optimizer.optimize(slot, |e| samples.cost(e));
                    debug_assert!(slot.is_coherent());
                }

                let fitness = self.fitness(&self.pool[i]);
                trace!(slot = i, cost = fitness.full(), raw = fitness.raw, "scored candidate");
                if i == favorite {
                    favorite_fitness = fitness;
                }
                if fitness.beats(&generation_best) {
                    best_slot = i;
                    generation_best = fitness;
                }
            }

            let improved = best_slot != favorite;
            // A favorite that scores NaN is kept without ever winning
            best = if improved {
                generation_best
            } else {
                favorite_fitness
            };
            self.favorite = best_slot;
            let node_count = self.pool[best_slot].node_count();
            history.push(GenerationStats {
                generation,
                best,
                node_count,
                improved,
            });

            if improved {
                debug!(
                    generation,
                    cost = best.full(),
                    raw = best.raw,
                    nodes = node_count,
                    "New favorite: {}",
                    self.pool[best_slot]
                );
            }

            if best.raw < self.config.epsilon {
                converged = true;
                info!("Converged after {} generations", generation + 1);
                break;
            }
        }

        let generations = history.len();
        let expression = self.pool[self.favorite].clone();
        info!(
            generations,
            converged,
            cost = best.full(),
            "Search finished with {}",
            expression
        );

        Solution {
            expression,
            fitness: best,
            generations,
            converged,
            history,
        }
    }

    /// Mutation sites allowed per shuffle round of the favorite
    fn site_budget(&self) -> usize {
        if self.mutator.config().scale_with_favorite {
            self.pool[self.favorite].node_count() + self.config.max_mut
        } else {
            self.config.max_mut
        }
    }
}

/// Borrow one pool slot for reading and a different one for writing
fn split_pair(pool: &mut [Expression], read: usize, write: usize) -> (&Expression, &mut Expression) {
    if read < write {
        let (head, tail) = pool.split_at_mut(write);
        (&head[read], &mut tail[0])
    } else {
        let (head, tail) = pool.split_at_mut(read);
        (&tail[0], &mut head[write])
    }
}
