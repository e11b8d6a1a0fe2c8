//! Checked decoding of expression buffers.
//!
//! The interpreter trusts the encoder and never fails. Buffers of unknown
//! origin go through here first.

use crate::expression::Expression;
use crate::instruction::Opcode;
use symreg_core::{Error, Result};

/// Nesting depth past which a buffer is rejected
pub const MAX_DEPTH: usize = 512;

/// Validate that an expression is well-formed and its node count is coherent.
///
/// When `arg_count` is given, every argument index must be below it.
pub fn validate_expression(expr: &Expression, arg_count: Option<usize>) -> Result<()> {
    let nodes = decode(expr.as_bytes(), arg_count)?;
    if nodes != expr.node_count() {
        return Err(Error::Validation(format!(
            "node count {} does not match {} nodes in the buffer",
            expr.node_count(),
            nodes
        )));
    }
    Ok(())
}

/// Check the structure of a raw buffer and return its node count
pub(crate) fn decode(bytes: &[u8], arg_count: Option<usize>) -> Result<usize> {
    let mut decoder = Decoder {
        bytes,
        arg_count,
        nodes: 0,
    };
    let end = decoder.sequence(0, 0)?;
    if end != bytes.len() {
        return Err(Error::Validation(format!(
            "{} trailing bytes after the top-level sequence",
            bytes.len() - end
        )));
    }
    Ok(decoder.nodes)
}

struct Decoder<'a> {
    bytes: &'a [u8],
    arg_count: Option<usize>,
    nodes: usize,
}

impl Decoder<'_> {
    fn sequence(&mut self, start: usize, depth: usize) -> Result<usize> {
        if depth > MAX_DEPTH {
            return Err(Error::Validation(format!(
                "sequence at byte {} is nested deeper than {}",
                start, MAX_DEPTH
            )));
        }

        let mut pos = start;
        let mut first = true;
        loop {
            let Some(&byte) = self.bytes.get(pos) else {
                return Err(Error::Validation(format!(
                    "sequence starting at byte {} is missing its End",
                    start
                )));
            };
            let op = Opcode::from_byte(byte).ok_or_else(|| {
                Error::Validation(format!("unknown opcode {} at byte {}", byte, pos))
            })?;
            pos += 1;

            if op == Opcode::End {
                if first {
                    return Err(Error::Validation(format!(
                        "empty sequence at byte {}",
                        start
                    )));
                }
                return Ok(pos);
            }
            if first && !op.is_terminal() {
                return Err(Error::Validation(format!(
                    "sequence at byte {} starts with {:?} instead of a terminal",
                    start, op
                )));
            }
            first = false;
            self.nodes += 1;

            if op.is_associative() {
                pos = self.sequence(pos, depth + 1)?;
                continue;
            }

            let width = op.operand_width();
            if pos + width > self.bytes.len() {
                return Err(Error::Validation(format!(
                    "{:?} at byte {} is missing its operand",
                    op,
                    pos - 1
                )));
            }
            if op == Opcode::Arg {
                if let Some(limit) = self.arg_count {
                    let index = self.bytes[pos] as usize;
                    if index >= limit {
                        return Err(Error::Validation(format!(
                            "argument index {} at byte {} is out of range for {} arguments",
                            index, pos, limit
                        )));
                    }
                }
            }
            pos += width;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(ops: &[Opcode]) -> Vec<u8> {
        ops.iter().map(|op| op.to_byte()).collect()
    }

    #[test]
    fn test_validate_fallback() {
        assert!(validate_expression(&Expression::fallback(), Some(0)).is_ok());
    }

    #[test]
    fn test_validate_empty_buffer() {
        assert!(validate_expression(&Expression::new(), None).is_err());
    }

    #[test]
    fn test_validate_empty_sequence() {
        assert!(decode(&bytes(&[Opcode::End]), None).is_err());
    }

    #[test]
    fn test_validate_missing_terminal() {
        let mut e = Expression::new();
        e.push(Opcode::Exp);
        e.push(Opcode::End);
        assert!(validate_expression(&e, None).is_err());

        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::Add);
        e.push(Opcode::Sin);
        e.push(Opcode::End);
        e.push(Opcode::End);
        assert!(validate_expression(&e, None).is_err());
    }

    #[test]
    fn test_validate_unterminated() {
        let mut e = Expression::new();
        e.push_arg(0);
        e.push(Opcode::Mul);
        e.push_arg(0);
        e.push(Opcode::End);
        assert!(validate_expression(&e, None).is_err());
    }

    #[test]
    fn test_validate_truncated_operand() {
        let raw = vec![Opcode::Constant.to_byte(), 0, 0, 0];
        assert!(decode(&raw, None).is_err());
    }

    #[test]
    fn test_validate_unknown_opcode() {
        let raw = vec![Opcode::Arg.to_byte(), 0, 42, Opcode::End.to_byte()];
        assert!(decode(&raw, None).is_err());
    }

    #[test]
    fn test_validate_trailing_bytes() {
        let mut raw = Expression::fallback().as_bytes().to_vec();
        raw.push(Opcode::End.to_byte());
        assert!(decode(&raw, None).is_err());
    }

    #[test]
    fn test_validate_arg_range() {
        let mut e = Expression::new();
        e.push_arg(1);
        e.push(Opcode::End);
        assert!(validate_expression(&e, Some(2)).is_ok());
        assert!(validate_expression(&e, Some(1)).is_err());
        assert!(validate_expression(&e, None).is_ok());
    }

    #[test]
    fn test_validate_incoherent_count() {
        let mut e = Expression::new();
        e.push_constant(1.0);
        e.push(Opcode::End);
        e.push(Opcode::Sin);
        assert!(validate_expression(&e, None).is_err());
    }

    #[test]
    fn test_validate_depth_limit() {
        let mut e = Expression::new();
        for _ in 0..=MAX_DEPTH + 1 {
            e.push_arg(0);
            e.push(Opcode::Add);
        }
        e.push_arg(0);
        for _ in 0..=MAX_DEPTH + 2 {
            e.push(Opcode::End);
        }
        assert!(validate_expression(&e, None).is_err());
    }
}
