//! Evaluation, traversal and rendering of expression buffers.
//!
//! All walks share one shape: a sequence is read until its `End`, and the
//! right operand of an associative opcode is walked recursively as its own
//! sequence. Self-modifying opcodes carry no payload and are never recursed
//! into.

use crate::expression::{ConstantSlot, Expression};
use crate::instruction::{Opcode, Scalar};
use std::fmt;

impl Expression {
    /// Evaluate the expression for the given arguments.
    ///
    /// An argument index past `args` reads as NaN.
    pub fn eval(&self, args: &[Scalar]) -> Scalar {
        self.eval_sequence(0, args).1
    }

    fn eval_sequence(&self, mut pos: usize, args: &[Scalar]) -> (usize, Scalar) {
        let mut acc = Scalar::NAN;
        loop {
            let op = self.opcode_at(pos);
            pos += 1;
            match op {
                Opcode::End => return (pos, acc),
                Opcode::Constant => acc = self.scalar_at(pos),
                Opcode::Arg => {
                    acc = args
                        .get(self.arg_at(pos) as usize)
                        .copied()
                        .unwrap_or(Scalar::NAN)
                }
                Opcode::Add | Opcode::Mul => {
                    let (next, other) = self.eval_sequence(pos, args);
                    acc = op.combine(acc, other);
                    pos = next;
                }
                _ => acc = op.apply(acc),
            }
            pos += op.operand_width();
        }
    }

    /// Position just past the `End` closing the sequence that starts at `pos`
    pub fn skip(&self, mut pos: usize) -> usize {
        loop {
            let op = self.opcode_at(pos);
            pos += 1;
            if op == Opcode::End {
                return pos;
            }
            if op.is_associative() {
                pos = self.skip(pos);
            } else {
                pos += op.operand_width();
            }
        }
    }

    /// Like [`skip`](Self::skip), adding the nodes walked to `count`
    pub fn count_nodes_from(&self, mut pos: usize, count: &mut usize) -> usize {
        loop {
            let op = self.opcode_at(pos);
            pos += 1;
            if op == Opcode::End {
                return pos;
            }
            *count += 1;
            if op.is_associative() {
                pos = self.count_nodes_from(pos, count);
            } else {
                pos += op.operand_width();
            }
        }
    }

    /// Node count recomputed from the buffer
    pub fn count_nodes(&self) -> usize {
        let mut count = 0;
        self.count_nodes_from(0, &mut count);
        count
    }

    /// Whether the maintained node count matches a fresh recount
    pub fn is_coherent(&self) -> bool {
        self.node_count() == self.count_nodes()
    }

    /// Handles to every constant operand, in traversal order
    pub fn constants(&self) -> Vec<ConstantSlot> {
        let mut slots = Vec::new();
        self.collect_constants(0, &mut slots);
        slots
    }

    fn collect_constants(&self, mut pos: usize, slots: &mut Vec<ConstantSlot>) -> usize {
        loop {
            let op = self.opcode_at(pos);
            pos += 1;
            match op {
                Opcode::End => return pos,
                Opcode::Constant => slots.push(ConstantSlot(pos)),
                Opcode::Add | Opcode::Mul => {
                    pos = self.collect_constants(pos, slots);
                    continue;
                }
                _ => {}
            }
            pos += op.operand_width();
        }
    }

    /// Render as one-line infix text. Diagnostic only; not meant to be parsed.
    pub fn format(&self) -> String {
        self.format_sequence(0).1
    }

    fn format_sequence(&self, mut pos: usize) -> (usize, String) {
        let mut acc = String::new();
        loop {
            let op = self.opcode_at(pos);
            pos += 1;
            match op {
                Opcode::End => return (pos, acc),
                Opcode::Constant => acc = self.scalar_at(pos).to_string(),
                Opcode::Arg => acc = format!("x{}", self.arg_at(pos)),
                Opcode::Opp => {
                    acc = if acc.starts_with('-') {
                        format!("-({})", acc)
                    } else {
                        format!("-{}", acc)
                    }
                }
                Opcode::Add | Opcode::Mul => {
                    let (next, rhs) = self.format_sequence(pos);
                    acc = format!("({} {} {})", acc, op.infix_symbol(), rhs);
                    pos = next;
                }
                _ => acc = format!("{}({})", op.function_name(), acc),
            }
            pos += op.operand_width();
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}
