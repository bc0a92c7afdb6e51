//! Edge-sampled single-bit storage cells.
//!
//! Cells are the only stateful elements. During settlement a cell output is
//! a fixed level; its data and clear inputs are read only by
//! [`crate::Simulation::tick`].

use crate::netlist::{Netlist, WireId};

impl Netlist {
    /// Plain D flip-flop: samples `data` on every edge. Returns `q`.
    pub fn dff(&mut self, data: WireId) -> WireId {
        self.add_cell(data, None).1
    }

    /// D flip-flop with synchronous clear. When `clear` is high at the edge
    /// the cell goes low regardless of `data`. Returns `q`.
    pub fn dffc(&mut self, data: WireId, clear: WireId) -> WireId {
        self.add_cell(data, Some(clear)).1
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::simulation::start;
    use crate::{Netlist, SimConfig};

    #[rstest]
    #[case::hold_low(false, false, false)]
    #[case::load_high(true, false, true)]
    #[case::clear_wins(true, true, false)]
    #[case::clear_low_data(false, true, false)]
    fn dffc_next_state(#[case] data: bool, #[case] clear: bool, #[case] expected: bool) {
        let mut net = Netlist::new();
        let d = net.wire();
        let c = net.wire();
        let q = net.dffc(d, c);
        let mut sim = start(net.freeze().expect("freezes"), &SimConfig::default())
            .expect("settles");

        sim.set(d, data).expect("free wire");
        sim.set(c, clear).expect("free wire");
        let _ = sim.update().expect("settles");
        assert!(!sim.get(q), "settlement alone must not load the cell");

        let _ = sim.tick().expect("settles");
        assert_eq!(sim.get(q), expected);
    }

    #[test]
    fn dff_retains_level_until_next_edge() {
        let mut net = Netlist::new();
        let d = net.wire();
        let q = net.dff(d);
        let mut sim = start(net.freeze().expect("freezes"), &SimConfig::default())
            .expect("settles");

        sim.set(d, true).expect("free wire");
        let _ = sim.tick().expect("settles");
        assert!(sim.get(q));

        sim.set(d, false).expect("free wire");
        let _ = sim.update().expect("settles");
        assert!(sim.get(q));

        let _ = sim.tick().expect("settles");
        assert!(!sim.get(q));
    }

    #[test]
    fn clear_overrides_a_set_cell() {
        let mut net = Netlist::new();
        let d = net.wire();
        let c = net.wire();
        let q = net.dffc(d, c);
        let mut sim = start(net.freeze().expect("freezes"), &SimConfig::default())
            .expect("settles");

        sim.set(d, true).expect("free wire");
        let _ = sim.tick().expect("settles");
        assert!(sim.get(q));

        sim.set(c, true).expect("free wire");
        let _ = sim.tick().expect("settles");
        assert!(!sim.get(q));
    }
}
