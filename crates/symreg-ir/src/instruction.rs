//! Instruction vocabulary for the expression bytecode.
//!
//! Every instruction starts with a one-byte tag. `Constant` is followed by
//! an 8-byte little-endian float, `Arg` by a one-byte argument index, and
//! `Add`/`Mul` by a complete nested sequence closed by its own `End`.

/// Scalar type flowing through evaluation
pub type Scalar = f64;

/// Argument index operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArgIndex(pub u8);

/// Expression opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // Terminals
    Constant = 0,
    Arg = 1,

    // Self-modifying
    Opp = 2,
    Inv = 3,
    Sin = 4,
    Exp = 5,
    Log = 6,

    // Associative
    Add = 7,
    Mul = 8,

    End = 9,
}

impl Opcode {
    pub const TERMINALS: [Opcode; 2] = [Opcode::Constant, Opcode::Arg];
    pub const SELF_MODIFYING: [Opcode; 5] =
        [Opcode::Opp, Opcode::Inv, Opcode::Sin, Opcode::Exp, Opcode::Log];
    pub const ASSOCIATIVE: [Opcode; 2] = [Opcode::Add, Opcode::Mul];

    /// Decode a tag byte
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        Some(match byte {
            0 => Opcode::Constant,
            1 => Opcode::Arg,
            2 => Opcode::Opp,
            3 => Opcode::Inv,
            4 => Opcode::Sin,
            5 => Opcode::Exp,
            6 => Opcode::Log,
            7 => Opcode::Add,
            8 => Opcode::Mul,
            9 => Opcode::End,
            _ => return None,
        })
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Returns true if this opcode seeds the accumulator
    pub fn is_terminal(&self) -> bool {
        matches!(self, Opcode::Constant | Opcode::Arg)
    }

    /// Returns true if this opcode rewrites the accumulator in place
    pub fn is_self_modifying(&self) -> bool {
        matches!(
            self,
            Opcode::Opp | Opcode::Inv | Opcode::Sin | Opcode::Exp | Opcode::Log
        )
    }

    /// Returns true if this opcode is followed by a nested sequence
    pub fn is_associative(&self) -> bool {
        matches!(self, Opcode::Add | Opcode::Mul)
    }

    /// Bytes of inline operand following the tag
    pub fn operand_width(&self) -> usize {
        match self {
            Opcode::Constant => std::mem::size_of::<Scalar>(),
            Opcode::Arg => std::mem::size_of::<u8>(),
            _ => 0,
        }
    }

    /// Apply a self-modifying opcode to the accumulator
    pub fn apply(&self, acc: Scalar) -> Scalar {
        match self {
            Opcode::Opp => -acc,
            Opcode::Inv => 1.0 / acc,
            Opcode::Sin => acc.sin(),
            Opcode::Exp => acc.exp(),
            Opcode::Log => acc.ln(),
            _ => acc,
        }
    }

    /// Fold a nested result into the accumulator
    pub fn combine(&self, acc: Scalar, other: Scalar) -> Scalar {
        match self {
            Opcode::Add => acc + other,
            Opcode::Mul => acc * other,
            _ => acc,
        }
    }

    /// Function name used when rendering self-modifying opcodes
    pub fn function_name(&self) -> &'static str {
        match self {
            Opcode::Inv => "inv",
            Opcode::Sin => "sin",
            Opcode::Exp => "exp",
            Opcode::Log => "log",
            _ => "",
        }
    }

    /// Infix symbol used when rendering associative opcodes
    pub fn infix_symbol(&self) -> &'static str {
        match self {
            Opcode::Add => "+",
            Opcode::Mul => "*",
            _ => "",
        }
    }
}

/// Values that can be appended to an expression buffer
pub trait Encode {
    /// Opcode carried by this value, if it is a tag
    fn opcode(&self) -> Option<Opcode> {
        None
    }

    fn encode_into(&self, buf: &mut Vec<u8>);

    fn encoded_len(&self) -> usize;
}

impl Encode for Opcode {
    fn opcode(&self) -> Option<Opcode> {
        Some(*self)
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.to_byte());
    }

    fn encoded_len(&self) -> usize {
        1
    }
}

impl Encode for Scalar {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn encoded_len(&self) -> usize {
        std::mem::size_of::<Scalar>()
    }
}

impl Encode for ArgIndex {
    fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.push(self.0);
    }

    fn encoded_len(&self) -> usize {
        1
    }
}
