//! Owned, append-only expression buffer.

use crate::instruction::{ArgIndex, Encode, Opcode, Scalar};
use crate::validation;
use symreg_core::Result;

/// Stable handle to the operand of one `Constant` instruction.
///
/// Handles are byte offsets, so they survive buffer reallocation. They are
/// invalidated only when the expression is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstantSlot(pub(crate) usize);

impl ConstantSlot {
    /// Byte offset of the operand inside the buffer
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Position in a buffer under construction, used to undo emitted nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mark {
    len: usize,
    node_count: usize,
}

/// An encoded expression together with its maintained node count
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    buf: Vec<u8>,
    node_count: usize,
}

impl Expression {
    /// Empty buffer with no sequence in it
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical fallback expression `Constant 0.0`
    pub fn fallback() -> Self {
        let mut expr = Self::new();
        expr.push_fallback();
        expr
    }

    /// Decode a raw buffer, checking structure and recounting nodes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let node_count = validation::decode(bytes, None)?;
        let mut expr = Self::new();
        expr.alloc(bytes.len());
        expr.buf.extend_from_slice(bytes);
        expr.node_count = node_count;
        Ok(expr)
    }

    /// Make room for `n` more bytes. Capacity doubles, or grows to the exact
    /// requirement when doubling is not enough.
    pub fn alloc(&mut self, n: usize) {
        let required = self.buf.len() + n;
        if required > self.buf.capacity() {
            let target = (self.buf.capacity().max(1) * 2).max(required);
            self.buf.reserve_exact(target - self.buf.len());
        }
    }

    /// Append an opcode or operand. Non-`End` opcodes count as nodes.
    pub fn push<T: Encode>(&mut self, value: T) {
        self.alloc(value.encoded_len());
        value.encode_into(&mut self.buf);
        if let Some(op) = value.opcode() {
            if op != Opcode::End {
                self.node_count += 1;
            }
        }
    }

    pub fn push_constant(&mut self, value: Scalar) {
        self.push(Opcode::Constant);
        self.push(value);
    }

    pub fn push_arg(&mut self, index: u8) {
        self.push(Opcode::Arg);
        self.push(ArgIndex(index));
    }

    /// Drop all content, keeping the allocation
    pub fn clear(&mut self) {
        self.buf.clear();
        self.node_count = 0;
    }

    /// Overwrite with the canonical fallback expression
    pub fn reset_to_fallback(&mut self) {
        self.clear();
        self.push_fallback();
    }

    fn push_fallback(&mut self) {
        self.push_constant(0.0);
        self.push(Opcode::End);
    }

    /// Maintained count of non-`End` opcodes
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn mark(&self) -> Mark {
        Mark {
            len: self.buf.len(),
            node_count: self.node_count,
        }
    }

    /// Discard everything emitted since `mark`
    pub(crate) fn rewind(&mut self, mark: Mark) {
        self.buf.truncate(mark.len);
        self.node_count = mark.node_count;
    }

    /// Read the tag at `pos`. Unknown tags and positions past the end read
    /// as `End`, which closes whatever sequence is being walked.
    pub(crate) fn opcode_at(&self, pos: usize) -> Opcode {
        self.buf
            .get(pos)
            .copied()
            .and_then(Opcode::from_byte)
            .unwrap_or(Opcode::End)
    }

    pub(crate) fn scalar_at(&self, pos: usize) -> Scalar {
        let mut bytes = [0u8; std::mem::size_of::<Scalar>()];
        match self.buf.get(pos..pos + bytes.len()) {
            Some(raw) => {
                bytes.copy_from_slice(raw);
                Scalar::from_le_bytes(bytes)
            }
            None => Scalar::NAN,
        }
    }

    pub(crate) fn arg_at(&self, pos: usize) -> u8 {
        self.buf.get(pos).copied().unwrap_or(u8::MAX)
    }

    /// Current value of a constant operand
    pub fn constant(&self, slot: ConstantSlot) -> Scalar {
        self.scalar_at(slot.0)
    }

    /// Overwrite a constant operand in place
    pub fn set_constant(&mut self, slot: ConstantSlot, value: Scalar) {
        let bytes = value.to_le_bytes();
        if let Some(raw) = self.buf.get_mut(slot.0..slot.0 + bytes.len()) {
            raw.copy_from_slice(&bytes);
        }
    }
}
