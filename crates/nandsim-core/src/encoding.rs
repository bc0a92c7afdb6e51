//! Instruction word layout and the decoder's control truth table.
//!
//! A word is 7 bits: bits 3..0 carry a 4-bit immediate, bits 6..4 the
//! opcode. Every 7-bit value decodes to some instruction.

use std::fmt;

/// Width of a memory word in bits.
pub const WORD_BITS: usize = 7;
/// Number of words addressable by the 3-bit program counter.
pub const MEMORY_WORDS: usize = 8;
/// Mask of the immediate field.
pub const IMMEDIATE_MASK: u8 = 0x0F;
/// Mask of a whole word.
pub const WORD_MASK: u8 = 0x7F;

/// Architectural data registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Register {
    A,
    B,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// The 3-bit opcode field (bits 6..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Opcode {
    /// `000`: no operation.
    Nop = 0b000,
    /// `001`: no operation, second encoding.
    NopAlt = 0b001,
    /// `010`: `A := A + imm`.
    AddA = 0b010,
    /// `011`: `A := imm`.
    MovA = 0b011,
    /// `100`: `B := B + imm`.
    AddB = 0b100,
    /// `101`: `B := imm`.
    MovB = 0b101,
    /// `110`: `PC := imm` when the carry flag is low.
    Jnc = 0b110,
    /// `111`: `PC := imm`.
    Jmp = 0b111,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Self; 8] = [
        Self::Nop,
        Self::NopAlt,
        Self::AddA,
        Self::MovA,
        Self::AddB,
        Self::MovB,
        Self::Jnc,
        Self::Jmp,
    ];

    /// Decodes the low three bits of `bits`.
    #[must_use]
    pub const fn from_u3(bits: u8) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    /// Returns the encoded field value.
    #[must_use]
    pub const fn as_u3(self) -> u8 {
        self as u8
    }

    /// Assembly mnemonic of this opcode.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop | Self::NopAlt => "NOP",
            Self::AddA | Self::AddB => "ADD",
            Self::MovA | Self::MovB => "MOV",
            Self::Jnc => "JNC",
            Self::Jmp => "JMP",
        }
    }

    /// Destination register, for register-targeted forms.
    #[must_use]
    pub const fn register(self) -> Option<Register> {
        match self {
            Self::AddA | Self::MovA => Some(Register::A),
            Self::AddB | Self::MovB => Some(Register::B),
            Self::Nop | Self::NopAlt | Self::Jnc | Self::Jmp => None,
        }
    }

    /// Control lines produced by the decoder for this opcode.
    #[must_use]
    pub const fn controls(self, carry: bool) -> ControlSignals {
        let (load_a, load_b, alu_add, select_b) = match self {
            Self::AddA => (true, false, true, false),
            Self::MovA => (true, false, false, false),
            Self::AddB => (false, true, true, true),
            Self::MovB => (false, true, false, true),
            Self::Nop | Self::NopAlt | Self::Jnc | Self::Jmp => (false, false, false, false),
        };
        let load_pc = match self {
            Self::Jnc => !carry,
            Self::Jmp => true,
            _ => false,
        };
        ControlSignals {
            load_a,
            load_b,
            load_pc,
            alu_add,
            select_b,
        }
    }
}

/// Decoder outputs for one `(opcode, carry)` combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ControlSignals {
    /// Register A takes the ALU result on the next edge.
    pub load_a: bool,
    /// Register B takes the ALU result on the next edge.
    pub load_b: bool,
    /// The program counter takes the ALU result instead of incrementing.
    pub load_pc: bool,
    /// ALU adds the selected register instead of bypassing the immediate.
    pub alu_add: bool,
    /// Register B (rather than A) is the ALU's second operand.
    pub select_b: bool,
}

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Operation selector.
    pub opcode: Opcode,
    /// 4-bit immediate operand.
    pub immediate: u8,
}

impl Instruction {
    /// Builds an instruction, truncating the immediate to 4 bits.
    #[must_use]
    pub const fn new(opcode: Opcode, immediate: u8) -> Self {
        Self {
            opcode,
            immediate: immediate & IMMEDIATE_MASK,
        }
    }

    /// Decodes a 7-bit word; bit 7 is ignored.
    #[must_use]
    pub const fn decode(word: u8) -> Self {
        Self {
            opcode: Opcode::from_u3(word >> 4),
            immediate: word & IMMEDIATE_MASK,
        }
    }

    /// Encodes into a 7-bit word.
    #[must_use]
    pub const fn encode(self) -> u8 {
        (self.opcode.as_u3() << 4) | (self.immediate & IMMEDIATE_MASK)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.opcode {
            Opcode::Nop | Opcode::NopAlt => f.write_str("NOP"),
            Opcode::AddA | Opcode::AddB | Opcode::MovA | Opcode::MovB => {
                let register = self.opcode.register().unwrap_or(Register::A);
                write!(
                    f,
                    "{} {register}, {}",
                    self.opcode.mnemonic(),
                    self.immediate
                )
            }
            Opcode::Jnc | Opcode::Jmp => write!(f, "{} {}", self.opcode.mnemonic(), self.immediate),
        }
    }
}

/// Unpacks a word into bits, bit 0 first.
#[must_use]
pub fn word_to_bits(word: u8) -> [bool; WORD_BITS] {
    std::array::from_fn(|bit| (word >> bit) & 1 == 1)
}

/// Packs bits (bit 0 first) into an unsigned value.
#[must_use]
pub fn bits_to_value(bits: &[bool]) -> u8 {
    bits.iter()
        .enumerate()
        .fold(0, |acc, (bit, level)| acc | (u8::from(*level) << bit))
}

/// Formats bits most-significant first, the conventional display order.
#[must_use]
pub fn format_msb_first(bits: &[bool]) -> String {
    bits.iter()
        .rev()
        .map(|level| if *level { '1' } else { '0' })
        .collect()
}
