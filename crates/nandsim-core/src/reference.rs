//! Behavioural model of the 3-bit instruction set.
//!
//! Executes the same encoding as the gate-level [`crate::Computer`] with
//! plain integer arithmetic. Both must agree tick for tick.

use crate::encoding::{Instruction, IMMEDIATE_MASK};
use crate::image::MemoryImage;

/// Architectural state plus ROM, advanced one instruction per [`step`].
///
/// [`step`]: ReferenceCpu::step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCpu {
    /// Register A.
    pub a: u8,
    /// Register B.
    pub b: u8,
    /// Program counter (3 bits).
    pub pc: u8,
    /// Carry flag.
    pub carry: bool,
    /// Program memory.
    pub memory: MemoryImage,
}

impl ReferenceCpu {
    /// Creates a reset CPU running `memory`.
    #[must_use]
    pub const fn new(memory: MemoryImage) -> Self {
        Self {
            a: 0,
            b: 0,
            pc: 0,
            carry: false,
            memory,
        }
    }

    /// Instruction at the current program counter.
    #[must_use]
    pub fn fetch(&self) -> Instruction {
        Instruction::decode(self.memory.word_value(usize::from(self.pc)))
    }

    /// Executes one instruction.
    pub fn step(&mut self) {
        let instruction = self.fetch();
        let controls = instruction.opcode.controls(self.carry);

        let operand = match (controls.alu_add, controls.select_b) {
            (false, _) => 0,
            (true, false) => self.a,
            (true, true) => self.b,
        };
        let total = instruction.immediate + operand;
        let result = total & IMMEDIATE_MASK;

        if controls.load_a {
            self.a = result;
        }
        if controls.load_b {
            self.b = result;
        }
        self.pc = if controls.load_pc {
            result & 0b111
        } else {
            (self.pc + 1) & 0b111
        };
        self.carry = total > IMMEDIATE_MASK;
    }

    /// Applies the clear line for one edge: registers and counter go low,
    /// the carry flag still samples the ALU.
    pub fn step_cleared(&mut self) {
        let mut next = self.clone();
        next.step();
        self.a = 0;
        self.b = 0;
        self.pc = 0;
        self.carry = next.carry;
    }
}
