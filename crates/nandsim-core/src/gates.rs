//! Boolean operators realised as fixed NAND networks.
//!
//! Every builder here only allocates new gates and returns the output wire,
//! so none of them can fail. They hold no state: each output is a pure
//! function of the current input levels once the network has settled.

use crate::netlist::{Netlist, WireId};

impl Netlist {
    /// `!a`, one NAND with both inputs tied.
    pub fn not(&mut self, a: WireId) -> WireId {
        self.nand(a, a)
    }

    /// `a & b`.
    pub fn and(&mut self, a: WireId, b: WireId) -> WireId {
        let n = self.nand(a, b);
        self.not(n)
    }

    /// `a | b`, by De Morgan.
    pub fn or(&mut self, a: WireId, b: WireId) -> WireId {
        let na = self.not(a);
        let nb = self.not(b);
        self.nand(na, nb)
    }

    /// `a & b & c`.
    pub fn and3(&mut self, a: WireId, b: WireId, c: WireId) -> WireId {
        let ab = self.and(a, b);
        self.and(ab, c)
    }

    /// `a | b | c | d`.
    pub fn or4(&mut self, a: WireId, b: WireId, c: WireId, d: WireId) -> WireId {
        let ab = self.or(a, b);
        let cd = self.or(c, d);
        self.or(ab, cd)
    }

    /// `a ^ b`, the classic four-NAND form.
    pub fn xor(&mut self, a: WireId, b: WireId) -> WireId {
        let n = self.nand(a, b);
        let an = self.nand(a, n);
        let bn = self.nand(b, n);
        self.nand(an, bn)
    }

    /// Two-way selector: `a` when `sel` is low, `b` when high.
    pub fn mux(&mut self, a: WireId, b: WireId, sel: WireId) -> WireId {
        let nsel = self.not(sel);
        let pick_a = self.nand(a, nsel);
        let pick_b = self.nand(b, sel);
        self.nand(pick_a, pick_b)
    }

    /// Full adder. Returns `(sum, carry_out)`.
    pub fn full_adder(&mut self, a: WireId, b: WireId, carry_in: WireId) -> (WireId, WireId) {
        let ab = self.nand(a, b);
        let a_ab = self.nand(a, ab);
        let b_ab = self.nand(b, ab);
        let half = self.nand(a_ab, b_ab);

        let hc = self.nand(half, carry_in);
        let h_hc = self.nand(half, hc);
        let c_hc = self.nand(carry_in, hc);
        let sum = self.nand(h_hc, c_hc);

        // (a & b) | (half & carry_in)
        let carry_out = self.nand(ab, hc);
        (sum, carry_out)
    }

    /// One-hot decode of a 3-bit address (`a0` lowest). Output `k` is high
    /// exactly when the address equals `k`.
    pub fn decode3(&mut self, a0: WireId, a1: WireId, a2: WireId) -> [WireId; 8] {
        let n0 = self.not(a0);
        let n1 = self.not(a1);
        let n2 = self.not(a2);
        let bit0 = [n0, a0];
        let bit1 = [n1, a1];
        let bit2 = [n2, a2];
        std::array::from_fn(|k| self.and3(bit0[k & 1], bit1[(k >> 1) & 1], bit2[(k >> 2) & 1]))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::simulation::{start, Simulation};
    use crate::{Netlist, SimConfig, WireId};

    type Gate2 = fn(&mut Netlist, WireId, WireId) -> WireId;

    fn settle(net: Netlist) -> Simulation {
        start(net.freeze().expect("netlist freezes"), &SimConfig::default())
            .expect("combinational network settles")
    }

    fn apply(sim: &mut Simulation, inputs: &[WireId], value: u32) {
        sim.set_bus(inputs, value).expect("inputs are free wires");
        let _ = sim.update().expect("combinational network settles");
    }

    #[rstest]
    #[case::low(false, true)]
    #[case::high(true, false)]
    fn not_inverts(#[case] a: bool, #[case] expected: bool) {
        let mut net = Netlist::new();
        let input = net.wire();
        let out = net.not(input);
        let mut sim = settle(net);

        sim.set(input, a).expect("free wire");
        let _ = sim.update().expect("settles");
        assert_eq!(sim.get(out), expected);
    }

    #[rstest]
    #[case::and(Netlist::and as Gate2, [false, false, false, true])]
    #[case::or(Netlist::or as Gate2, [false, true, true, true])]
    #[case::xor(Netlist::xor as Gate2, [false, true, true, false])]
    #[case::nand(Netlist::nand as Gate2, [true, true, true, false])]
    fn two_input_truth_tables(
        #[case] build: Gate2,
        #[case] table: [bool; 4],
    ) {
        let mut net = Netlist::new();
        let inputs = net.wires::<2>();
        let out = build(&mut net, inputs[0], inputs[1]);
        let mut sim = settle(net);

        for (value, expected) in table.iter().enumerate() {
            apply(&mut sim, &inputs, u32::try_from(value).expect("small"));
            assert_eq!(sim.get(out), *expected, "inputs {value:02b}");
        }
    }

    #[test]
    fn and3_and_or4_cover_their_operand_lists() {
        let mut net = Netlist::new();
        let inputs = net.wires::<4>();
        let all3 = net.and3(inputs[0], inputs[1], inputs[2]);
        let any4 = net.or4(inputs[0], inputs[1], inputs[2], inputs[3]);
        let mut sim = settle(net);

        for value in 0..16 {
            apply(&mut sim, &inputs, value);
            assert_eq!(sim.get(all3), value & 0b111 == 0b111, "and3 {value:04b}");
            assert_eq!(sim.get(any4), value != 0, "or4 {value:04b}");
        }
    }

    #[test]
    fn mux_low_select_picks_first_operand() {
        let mut net = Netlist::new();
        let inputs = net.wires::<3>();
        let out = net.mux(inputs[0], inputs[1], inputs[2]);
        let mut sim = settle(net);

        for value in 0..8 {
            apply(&mut sim, &inputs, value);
            let (a, b, sel) = (value & 1 == 1, value & 2 == 2, value & 4 == 4);
            assert_eq!(sim.get(out), if sel { b } else { a }, "mux {value:03b}");
        }
    }

    #[test]
    fn full_adder_matches_truth_table() {
        let mut net = Netlist::new();
        let inputs = net.wires::<3>();
        let (sum, carry) = net.full_adder(inputs[0], inputs[1], inputs[2]);
        let mut sim = settle(net);

        for value in 0..8u32 {
            apply(&mut sim, &inputs, value);
            let total = value.count_ones();
            assert_eq!(sim.get(sum), total & 1 == 1, "sum {value:03b}");
            assert_eq!(sim.get(carry), total >= 2, "carry {value:03b}");
        }
    }

    #[test]
    fn decode3_asserts_exactly_one_line() {
        let mut net = Netlist::new();
        let address = net.wires::<3>();
        let lines = net.decode3(address[0], address[1], address[2]);
        let mut sim = settle(net);

        for value in 0..8u32 {
            apply(&mut sim, &address, value);
            let levels = sim.bits(&lines);
            assert_eq!(levels.iter().filter(|level| **level).count(), 1);
            let selected = usize::try_from(value).expect("small");
            assert!(levels[selected], "line {value} should be selected");
        }
    }
}
