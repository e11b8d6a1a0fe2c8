//! Bytecode representation for candidate expressions.
//!
//! An expression is a flat byte buffer of tagged instructions evaluated as a
//! left fold over one accumulator. Nesting is the only grouping mechanism:
//! the right operand of `Add`/`Mul` is a complete nested sequence.
//! The encoding is:
//! - Compact: one tag byte per node, inline operands
//! - Mutation-friendly: the shuffle engine rewrites it in a single pass
//! - Self-checking: a maintained node count can be verified against a recount

pub mod instruction;
pub mod expression;
pub mod interpreter;
pub mod mutation;
pub mod validation;

pub use instruction::{ArgIndex, Encode, Opcode, Scalar};
pub use expression::{ConstantSlot, Expression};
pub use mutation::Mutator;
pub use validation::validate_expression;
