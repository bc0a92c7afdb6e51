//! Fixed composite designs: counter, register, carry flag, selector, ALU,
//! instruction decoder and ROM.
//!
//! Each builder takes its input wires and returns its output wires. Builders
//! that close a feedback loop through a storage cell do so with
//! [`Netlist::connect`] and can therefore fail.

use crate::encoding::{MEMORY_WORDS, WORD_BITS};
use crate::netlist::{Netlist, NetlistError, WireId};

/// Output wires of the 4-bit ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluOutputs {
    /// Result, low-order bit first.
    pub sum: [WireId; 4],
    /// Carry out of the top adder stage.
    pub carry: WireId,
}

/// Control lines derived by the instruction decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOutputs {
    /// Load register A.
    pub load_a: WireId,
    /// Load register B.
    pub load_b: WireId,
    /// Load the program counter.
    pub load_pc: WireId,
    /// ALU adds when high, bypasses when low.
    pub alu_mode: WireId,
    /// Selects register B as the ALU's second operand.
    pub select: WireId,
}

impl Netlist {
    /// Loadable 3-bit counter with synchronous clear.
    ///
    /// On each edge: clear forces zero; otherwise load takes `data`;
    /// otherwise the count increments modulo 8. Returns `q`, bit 0 first.
    ///
    /// # Errors
    ///
    /// Propagates [`NetlistError`] from closing the feedback loop.
    pub fn counter3(
        &mut self,
        data: [WireId; 3],
        load: WireId,
        clear: WireId,
    ) -> Result<[WireId; 3], NetlistError> {
        let next = self.wires::<3>();
        let q = next.map(|d| self.dffc(d, clear));

        let inc0 = self.not(q[0]);
        let inc1 = self.xor(q[0], q[1]);
        let inc2 = {
            let toggle = self.xor(q[0], q[2]);
            let rising = self.and(q[1], toggle);
            let n1 = self.not(q[1]);
            let holding = self.and(q[2], n1);
            self.or(rising, holding)
        };

        for (bit, increment) in [inc0, inc1, inc2].into_iter().enumerate() {
            let chosen = self.mux(increment, data[bit], load);
            self.connect(chosen, next[bit])?;
        }
        Ok(q)
    }

    /// Loadable 4-bit register with synchronous clear. Holds when load is
    /// low. Returns `q`, bit 0 first.
    ///
    /// # Errors
    ///
    /// Propagates [`NetlistError`] from closing the hold loop.
    pub fn register4(
        &mut self,
        data: [WireId; 4],
        load: WireId,
        clear: WireId,
    ) -> Result<[WireId; 4], NetlistError> {
        let next = self.wires::<4>();
        let q = next.map(|d| self.dffc(d, clear));
        for ((held, input), slot) in q.into_iter().zip(data).zip(next) {
            let chosen = self.mux(held, input, load);
            self.connect(chosen, slot)?;
        }
        Ok(q)
    }

    /// Carry flag: a plain cell sampling `data` on every edge.
    pub fn carry_flag(&mut self, data: WireId) -> WireId {
        self.dff(data)
    }

    /// Per-bit selector between two 4-bit words; low `select` picks `a`.
    pub fn selector4(&mut self, a: [WireId; 4], b: [WireId; 4], select: WireId) -> [WireId; 4] {
        std::array::from_fn(|bit| self.mux(a[bit], b[bit], select))
    }

    /// Add/bypass unit. With `mode` low the result is `a` and the carry is
    /// low; with `mode` high it is the 4-bit ripple sum `a + b`.
    pub fn alu4(&mut self, a: [WireId; 4], b: [WireId; 4], mode: WireId) -> AluOutputs {
        let mut carry = self.constant(false);
        let sum = std::array::from_fn(|bit| {
            let gated = self.and(b[bit], mode);
            let (s, c) = self.full_adder(a[bit], gated, carry);
            carry = c;
            s
        });
        AluOutputs { sum, carry }
    }

    /// Instruction decoder over opcode bits `[bit4, bit5, bit6]` and the
    /// carry flag.
    pub fn decoder(&mut self, opcode: [WireId; 3], carry: WireId) -> DecoderOutputs {
        let [i0, i1, i2] = opcode;
        let n0 = self.not(i0);
        let n1 = self.not(i1);
        let n2 = self.not(i2);
        let nc = self.not(carry);

        let load_a = self.and(n2, i1);
        let load_b = self.and(i2, n1);

        let jump_no_carry = self.and3(i2, i1, nc);
        let jump = self.and3(i2, i1, i0);
        let load_pc = self.or(jump_no_carry, jump);

        let add_a = self.and3(n2, i1, n0);
        let add_b = self.and3(i2, n1, n0);
        let alu_mode = self.or(add_a, add_b);

        let select = self.and(i2, n1);

        DecoderOutputs {
            load_a,
            load_b,
            load_pc,
            alu_mode,
            select,
        }
    }

    /// Read-only memory: the word addressed by `address` (bit 0 first),
    /// selected by one-hot decode and merged with OR trees.
    pub fn rom(
        &mut self,
        words: &[[WireId; WORD_BITS]; MEMORY_WORDS],
        address: [WireId; 3],
    ) -> [WireId; WORD_BITS] {
        let select = self.decode3(address[0], address[1], address[2]);
        std::array::from_fn(|bit| {
            let masked: [WireId; MEMORY_WORDS] =
                std::array::from_fn(|k| self.and(select[k], words[k][bit]));
            let low = self.or4(masked[0], masked[1], masked[2], masked[3]);
            let high = self.or4(masked[4], masked[5], masked[6], masked[7]);
            self.or(low, high)
        })
    }
}
