//! Structural mutation ("shuffle") of expressions.
//!
//! A round picks a handful of node ordinals in the source, tags each one
//! `Replace` or `Remove`, and re-emits the source into a destination buffer
//! in a single walk, rewriting the tagged nodes on the way.

use crate::expression::{Expression, Mark};
use crate::instruction::{ArgIndex, Opcode};
use symreg_core::{MutationConfig, RandomSource};
use tracing::trace;

/// Edit applied at a chosen node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    /// Rewrite the node with a freshly sampled opcode
    Replace,
    /// Drop the node together with everything nested beneath it
    Remove,
}

#[derive(Debug, Clone)]
pub struct Mutator {
    config: MutationConfig,
    arg_count: usize,
}

impl Mutator {
    pub fn new(config: MutationConfig, arg_count: usize) -> Self {
        Self { config, arg_count }
    }

    pub fn config(&self) -> &MutationConfig {
        &self.config
    }

    /// Apply between 1 and `max_rounds` shuffle rounds to `source`, leaving
    /// the result in `out`.
    ///
    /// Rounds compound: each one shuffles the previous round's output. The
    /// two buffers are ping-ponged so neither ever aliases `source`.
    pub fn mutate<R: RandomSource + ?Sized>(
        &self,
        source: &Expression,
        out: &mut Expression,
        scratch: &mut Expression,
        rng: &mut R,
        max_sites: usize,
        max_rounds: usize,
    ) {
        let rounds = 1 + rng.below(max_rounds.max(1));
        self.shuffle(source, out, rng, max_sites);
        for _ in 1..rounds {
            self.shuffle(out, scratch, rng, max_sites);
            std::mem::swap(out, scratch);
        }
    }

    /// One shuffle round from `source` into `dest`, overwriting `dest`.
    ///
    /// Between 1 and `max_sites` node ordinals are drawn; repeated draws
    /// collapse onto the same node, the last tag winning. The result is
    /// always coherent and never empty.
    pub fn shuffle<R: RandomSource + ?Sized>(
        &self,
        source: &Expression,
        dest: &mut Expression,
        rng: &mut R,
        max_sites: usize,
    ) {
        dest.clear();
        let nodes = source.node_count();
        if nodes == 0 {
            dest.reset_to_fallback();
            return;
        }

        let mut sites = vec![None; nodes];
        let count = 1 + rng.below(max_sites.max(1));
        for _ in 0..count {
            let at = rng.below(nodes);
            sites[at] = Some(if rng.below(2) == 0 {
                Edit::Replace
            } else {
                Edit::Remove
            });
        }

        let mut walk = Walk {
            mutator: self,
            source,
            dest: &mut *dest,
            rng: &mut *rng,
            sites: &sites,
            ordinal: 0,
        };
        walk.sequence(0, false);

        if dest.node_count() == 0 {
            dest.reset_to_fallback();
        }
        trace!(
            sites = count,
            source_nodes = nodes,
            result_nodes = dest.node_count(),
            "shuffled expression"
        );
    }

    /// Append a fresh `Constant` or `Arg` terminal
    fn push_random_terminal<R: RandomSource + ?Sized>(&self, dest: &mut Expression, rng: &mut R) {
        if self.arg_count == 0 || rng.below(2) == 0 {
            dest.push(Opcode::Constant);
            dest.push(rng.next_signed() * self.config.constant_range);
        } else {
            dest.push(Opcode::Arg);
            dest.push(ArgIndex(rng.below(self.arg_count) as u8));
        }
    }

    /// Append an associative opcode whose operand is a fresh terminal
    fn push_random_graft<R: RandomSource + ?Sized>(&self, dest: &mut Expression, rng: &mut R) {
        dest.push(Opcode::ASSOCIATIVE[rng.below(Opcode::ASSOCIATIVE.len())]);
        self.push_random_terminal(dest, rng);
        dest.push(Opcode::End);
    }

    fn push_random_self_modifying<R: RandomSource + ?Sized>(dest: &mut Expression, rng: &mut R) {
        dest.push(Opcode::SELF_MODIFYING[rng.below(Opcode::SELF_MODIFYING.len())]);
    }

    /// Rewrite the node just emitted at `start`
    fn replace<R: RandomSource + ?Sized>(
        &self,
        op: Opcode,
        start: Mark,
        dest: &mut Expression,
        rng: &mut R,
    ) {
        if op.is_terminal() {
            match rng.below(3) {
                0 => Self::push_random_self_modifying(dest, rng),
                1 => {
                    dest.rewind(start);
                    self.push_random_terminal(dest, rng);
                }
                _ => self.push_random_graft(dest, rng),
            }
        } else {
            dest.rewind(start);
            if rng.below(2) == 0 {
                Self::push_random_self_modifying(dest, rng);
            } else {
                self.push_random_graft(dest, rng);
            }
        }
    }
}

/// State of one shuffle walk over the source
struct Walk<'a, R: ?Sized> {
    mutator: &'a Mutator,
    source: &'a Expression,
    dest: &'a mut Expression,
    rng: &'a mut R,
    sites: &'a [Option<Edit>],
    ordinal: usize,
}

impl<R: RandomSource + ?Sized> Walk<'_, R> {
    /// Re-emit the sequence starting at `pos` and return the source position
    /// past its `End`.
    ///
    /// Removing a sequence's leading terminal inhibits the whole sequence.
    /// A nested sequence still needs a terminal for its parent operator, so
    /// one is sampled; an inhibited top-level sequence stays empty.
    fn sequence(&mut self, mut pos: usize, nested: bool) -> usize {
        let mut inhibited = false;
        loop {
            let op = self.source.opcode_at(pos);
            pos += 1;
            if op == Opcode::End {
                break;
            }

            let edit = self.sites.get(self.ordinal).copied().flatten();
            self.ordinal += 1;
            let start = self.dest.mark();
            let removed = inhibited || edit == Some(Edit::Remove);

            if op.is_terminal() {
                if removed {
                    if !inhibited && nested {
                        self.mutator.push_random_terminal(self.dest, self.rng);
                    }
                    inhibited = true;
                } else {
                    self.copy_terminal(op, pos);
                }
                pos += op.operand_width();
            } else if op.is_associative() {
                if removed {
                    let mut skipped = 0;
                    pos = self.source.count_nodes_from(pos, &mut skipped);
                    self.ordinal += skipped;
                } else {
                    self.dest.push(op);
                    pos = self.sequence(pos, true);
                }
            } else if !removed {
                self.dest.push(op);
            }

            if edit == Some(Edit::Replace) && !removed {
                self.mutator.replace(op, start, self.dest, self.rng);
            }
        }
        self.dest.push(Opcode::End);
        pos
    }

    fn copy_terminal(&mut self, op: Opcode, pos: usize) {
        match op {
            Opcode::Constant => self.dest.push_constant(self.source.scalar_at(pos)),
            _ => self.dest.push_arg(self.source.arg_at(pos)),
        }
    }
}
