//! Network-wide settlement and clock-edge advance.
//!
//! The driver knows nothing about what the circuit computes. It holds one
//! level per electrical node and one retained level per storage cell, and
//! exposes three operations:
//!
//! - [`Simulation::init`] resets every node and cell low and settles.
//! - [`Simulation::update`] re-evaluates every gate, pass after pass, until a
//!   full pass changes nothing.
//! - [`Simulation::tick`] samples every cell from the settled levels, commits
//!   all cells at once, then settles again.

use tracing::{debug, trace, warn};

use crate::config::SimConfig;
use crate::fault::SimError;
use crate::netlist::{Network, WireId};
use crate::state::RunState;

/// A frozen network plus its signal levels and cell contents.
#[derive(Debug, Clone)]
pub struct Simulation {
    network: Network,
    levels: Vec<bool>,
    retained: Vec<bool>,
    sampled: Vec<bool>,
    max_passes: usize,
    run_state: RunState,
    ticks: u64,
}

impl Simulation {
    /// Wraps a network with every node and cell at the reset level.
    ///
    /// The levels are not settled yet; call [`Simulation::init`] before the
    /// first edge advance.
    #[must_use]
    pub fn new(network: Network, config: &SimConfig) -> Self {
        let max_passes = config.settle_bound(network.gate_count());
        let mut sim = Self {
            levels: vec![false; network.node_count()],
            retained: vec![false; network.cell_count()],
            sampled: Vec::with_capacity(network.cell_count()),
            network,
            max_passes,
            run_state: RunState::Ready,
            ticks: 0,
        };
        sim.reset();
        sim
    }

    fn reset(&mut self) {
        self.levels.fill(false);
        self.retained.fill(false);
        for &(node, level) in &self.network.constants {
            self.levels[node] = level;
        }
        self.run_state = RunState::Ready;
        self.ticks = 0;
    }

    /// Resets all cells and wires low, clears any latched fault and settles.
    ///
    /// Returns the number of settlement passes used.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Oscillation`] when the reset state does not settle.
    pub fn init(&mut self) -> Result<usize, SimError> {
        self.reset();
        self.settle()
    }

    /// Settles the combinational network.
    ///
    /// Returns the number of passes used, including the final quiet pass.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Oscillation`] when no fixpoint is reached within
    /// the configured bound (the fault is latched), or
    /// [`SimError::FaultLatched`] when an earlier failure is still latched.
    pub fn update(&mut self) -> Result<usize, SimError> {
        self.ensure_ready()?;
        self.settle()
    }

    /// Performs one edge advance followed by settlement.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::update`].
    pub fn tick(&mut self) -> Result<usize, SimError> {
        self.ensure_ready()?;

        let levels = &self.levels;
        self.sampled.clear();
        self.sampled
            .extend(self.network.cells.iter().map(|cell| {
                !cell.clear.is_some_and(|clear| levels[clear]) && levels[cell.data]
            }));
        std::mem::swap(&mut self.retained, &mut self.sampled);

        self.ticks = self.ticks.wrapping_add(1);
        trace!(tick = self.ticks, "edge advance");
        self.settle()
    }

    fn ensure_ready(&self) -> Result<(), SimError> {
        match self.run_state {
            RunState::Ready => Ok(()),
            RunState::FaultLatched(_) => Err(SimError::FaultLatched),
        }
    }

    fn settle(&mut self) -> Result<usize, SimError> {
        for (cell, &level) in self.network.cells.iter().zip(&self.retained) {
            self.levels[cell.output] = level;
        }

        for pass in 1..=self.max_passes {
            let mut changed = false;
            for gate in &self.network.gates {
                let next = !(self.levels[gate.a] && self.levels[gate.b]);
                if self.levels[gate.output] != next {
                    self.levels[gate.output] = next;
                    changed = true;
                }
            }
            if !changed {
                trace!(passes = pass, "network settled");
                return Ok(pass);
            }
        }

        let fault = SimError::Oscillation {
            passes: self.max_passes,
        };
        warn!(%fault, "settlement failed, latching fault");
        self.run_state = RunState::FaultLatched(fault);
        Err(fault)
    }

    /// Injects a level on an undriven wire. The new level propagates on the
    /// next [`Simulation::update`] or [`Simulation::tick`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownWire`] for a wire from another netlist and
    /// [`SimError::DrivenWire`] when the wire has a driver.
    pub fn set(&mut self, wire: WireId, level: bool) -> Result<(), SimError> {
        let node = self
            .network
            .try_node(wire)
            .ok_or(SimError::UnknownWire(wire))?;
        if self.network.is_driven(wire) {
            return Err(SimError::DrivenWire(wire));
        }
        self.levels[node] = level;
        Ok(())
    }

    /// Injects a little-endian value onto a bus of undriven wires.
    ///
    /// # Errors
    ///
    /// As [`Simulation::set`], stopping at the first rejected wire; earlier
    /// wires keep their new levels.
    pub fn set_bus(&mut self, wires: &[WireId], value: u32) -> Result<(), SimError> {
        for (bit, wire) in wires.iter().enumerate() {
            self.set(*wire, (value >> bit) & 1 == 1)?;
        }
        Ok(())
    }

    /// Reads the current level of a wire.
    ///
    /// # Panics
    ///
    /// Panics when `wire` was allocated by a different netlist.
    #[must_use]
    pub fn get(&self, wire: WireId) -> bool {
        self.levels[self.network.node(wire)]
    }

    /// Reads a bus, low-order bit first.
    ///
    /// # Panics
    ///
    /// As [`Simulation::get`].
    #[must_use]
    pub fn bits<const N: usize>(&self, wires: &[WireId; N]) -> [bool; N] {
        std::array::from_fn(|bit| self.get(wires[bit]))
    }

    /// Reads a bus as a little-endian unsigned value.
    ///
    /// # Panics
    ///
    /// As [`Simulation::get`].
    #[must_use]
    pub fn read_bus(&self, wires: &[WireId]) -> u32 {
        wires
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, wire)| acc | (u32::from(self.get(*wire)) << bit))
    }

    /// Reads a wire by the name it was given at construction.
    #[must_use]
    pub fn probe(&self, name: &str) -> Option<bool> {
        self.network.wire_named(name).map(|wire| self.get(wire))
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Number of edge advances since the last reset.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Settlement pass bound in effect.
    #[must_use]
    pub const fn max_passes(&self) -> usize {
        self.max_passes
    }

    /// The frozen network being simulated.
    #[must_use]
    pub const fn network(&self) -> &Network {
        &self.network
    }
}

/// Wraps `network` and runs the initial reset and settlement.
///
/// # Errors
///
/// Propagates settlement failure of the reset state.
pub(crate) fn start(network: Network, config: &SimConfig) -> Result<Simulation, SimError> {
    let mut sim = Simulation::new(network, config);
    let passes = sim.init()?;
    debug!(
        nodes = sim.network.node_count(),
        gates = sim.network.gate_count(),
        cells = sim.network.cell_count(),
        passes,
        "simulation initialised"
    );
    Ok(sim)
}
