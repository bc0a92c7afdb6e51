//! Wire graph and drive relationships for gate-level circuits.
//!
//! A [`Netlist`] is the mutable construction-time view of a circuit. Wires are
//! arena indices; [`Netlist::connect`] merges two wires into one electrical
//! node with a union-find, which is how feedback loops get closed after the
//! logic driving them has been built. Once construction is finished the
//! netlist is frozen into a [`Network`], a dense node array consumed by the
//! simulation driver.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::fault::ErrorClass;

/// Handle to a single two-level signal wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(u32);

impl WireId {
    /// Returns the arena index of this wire.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Handle to a clocked storage cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u32);

impl CellId {
    /// Returns the arena index of this cell.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Source that determines the level of an electrical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    /// Output of the NAND gate at this index.
    Gate(usize),
    /// Retained level of a storage cell.
    Cell(CellId),
    /// Fixed level applied at every reset.
    Constant(bool),
}

/// Primitive two-input NAND relation between wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nand {
    /// First operand.
    pub a: WireId,
    /// Second operand.
    pub b: WireId,
    /// Driven output.
    pub output: WireId,
}

/// Wiring of one storage cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSpec {
    /// Data input sampled on each edge advance.
    pub data: WireId,
    /// Optional synchronous clear input; overrides `data` when high.
    pub clear: Option<WireId>,
    /// Output wire carrying the retained level.
    pub output: WireId,
}

/// Construction-time failures of the signal network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum NetlistError {
    /// Both sides of a `connect` already have a driver.
    #[error("cannot connect {a} and {b}: both nodes are already driven")]
    ConflictingDrivers {
        /// First wire passed to `connect`.
        a: WireId,
        /// Second wire passed to `connect`.
        b: WireId,
    },
    /// A wire handle does not belong to this netlist.
    #[error("wire {0} does not exist in this netlist")]
    UnknownWire(WireId),
    /// A wire name is already bound to another wire.
    #[error("wire name `{0}` is already in use")]
    DuplicateName(String),
}

impl NetlistError {
    /// Every netlist error is a design error in the circuit description.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        ErrorClass::MalformedCircuit
    }
}

/// Mutable circuit description: wires, NAND gates, storage cells and names.
#[derive(Debug, Clone, Default)]
pub struct Netlist {
    parent: Vec<u32>,
    rank: Vec<u8>,
    // Only meaningful at union-find roots.
    drivers: Vec<Option<Driver>>,
    gates: Vec<Nand>,
    cells: Vec<CellSpec>,
    names: BTreeMap<String, WireId>,
}

impl Netlist {
    /// Creates an empty netlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of wires allocated so far.
    #[must_use]
    pub fn wire_count(&self) -> usize {
        self.parent.len()
    }

    /// Number of primitive NAND gates.
    #[must_use]
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of storage cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn alloc(&mut self, driver: Option<Driver>) -> WireId {
        let id = u32::try_from(self.parent.len()).unwrap_or(u32::MAX);
        self.parent.push(id);
        self.rank.push(0);
        self.drivers.push(driver);
        WireId(id)
    }

    /// Allocates an undriven wire. Its level is set by [`Netlist::connect`]ing
    /// it to a driver or by injection at simulation time.
    pub fn wire(&mut self) -> WireId {
        self.alloc(None)
    }

    /// Allocates `N` undriven wires.
    pub fn wires<const N: usize>(&mut self) -> [WireId; N] {
        std::array::from_fn(|_| self.wire())
    }

    /// Allocates a wire tied to a fixed level.
    pub fn constant(&mut self, level: bool) -> WireId {
        self.alloc(Some(Driver::Constant(level)))
    }

    /// Adds the universal primitive: `output = !(a & b)`.
    pub fn nand(&mut self, a: WireId, b: WireId) -> WireId {
        let output = self.alloc(Some(Driver::Gate(self.gates.len())));
        self.gates.push(Nand { a, b, output });
        output
    }

    /// Adds a storage cell and returns its handle and output wire.
    pub fn add_cell(&mut self, data: WireId, clear: Option<WireId>) -> (CellId, WireId) {
        let cell = CellId(u32::try_from(self.cells.len()).unwrap_or(u32::MAX));
        let output = self.alloc(Some(Driver::Cell(cell)));
        self.cells.push(CellSpec {
            data,
            clear,
            output,
        });
        (cell, output)
    }

    fn check(&self, wire: WireId) -> Result<(), NetlistError> {
        if wire.index() < self.parent.len() {
            Ok(())
        } else {
            Err(NetlistError::UnknownWire(wire))
        }
    }

    fn root(&self, wire: WireId) -> usize {
        let mut node = wire.index();
        while self.parent[node] as usize != node {
            node = self.parent[node] as usize;
        }
        node
    }

    /// Returns the driver of the node `wire` belongs to, if any.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::UnknownWire`] for a foreign handle.
    pub fn driver(&self, wire: WireId) -> Result<Option<Driver>, NetlistError> {
        self.check(wire)?;
        Ok(self.drivers[self.root(wire)])
    }

    /// Returns `true` when both wires belong to the same electrical node.
    #[must_use]
    pub fn same_node(&self, a: WireId, b: WireId) -> bool {
        self.check(a).is_ok() && self.check(b).is_ok() && self.root(a) == self.root(b)
    }

    /// Unifies two wires into one node so they always carry the same level.
    ///
    /// At most one of the two nodes may be driven. Connecting wires that are
    /// already unified is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::ConflictingDrivers`] when both nodes are driven
    /// and [`NetlistError::UnknownWire`] for a foreign handle.
    pub fn connect(&mut self, a: WireId, b: WireId) -> Result<(), NetlistError> {
        self.check(a)?;
        self.check(b)?;

        let ra = self.root(a);
        let rb = self.root(b);
        if ra == rb {
            return Ok(());
        }

        let driver = match (self.drivers[ra], self.drivers[rb]) {
            (Some(_), Some(_)) => return Err(NetlistError::ConflictingDrivers { a, b }),
            (Some(driver), None) | (None, Some(driver)) => Some(driver),
            (None, None) => None,
        };

        let (child, root) = if self.rank[ra] < self.rank[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        if self.rank[child] == self.rank[root] {
            self.rank[root] = self.rank[root].saturating_add(1);
        }
        self.parent[child] = self.parent[root];
        self.drivers[root] = driver;
        self.drivers[child] = None;
        Ok(())
    }

    /// Binds a human-readable name to a wire for later probing.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::DuplicateName`] when the name is taken.
    pub fn name(&mut self, wire: WireId, name: &str) -> Result<(), NetlistError> {
        self.check(wire)?;
        if self.names.contains_key(name) {
            return Err(NetlistError::DuplicateName(name.to_string()));
        }
        let _ = self.names.insert(name.to_string(), wire);
        Ok(())
    }

    /// Binds `prefix0`, `prefix1`, ... to a bus, low-order bit first.
    ///
    /// # Errors
    ///
    /// Propagates [`Netlist::name`] failures.
    pub fn name_bus(&mut self, wires: &[WireId], prefix: &str) -> Result<(), NetlistError> {
        for (bit, wire) in wires.iter().enumerate() {
            self.name(*wire, &format!("{prefix}{bit}"))?;
        }
        Ok(())
    }

    /// Looks up a named wire.
    #[must_use]
    pub fn wire_named(&self, name: &str) -> Option<WireId> {
        self.names.get(name).copied()
    }

    /// Freezes the netlist into a dense node network.
    ///
    /// # Errors
    ///
    /// Returns [`NetlistError::UnknownWire`] when a gate or cell refers to a
    /// wire that was never allocated here.
    pub fn freeze(self) -> Result<Network, NetlistError> {
        for gate in &self.gates {
            self.check(gate.a)?;
            self.check(gate.b)?;
        }
        for cell in &self.cells {
            self.check(cell.data)?;
            if let Some(clear) = cell.clear {
                self.check(clear)?;
            }
        }

        let mut node_of_root = vec![usize::MAX; self.parent.len()];
        let mut node_of = Vec::with_capacity(self.parent.len());
        let mut constants = Vec::new();
        let mut driven = Vec::new();
        for index in 0..self.parent.len() {
            let root = self.root(WireId(u32::try_from(index).unwrap_or(u32::MAX)));
            if node_of_root[root] == usize::MAX {
                node_of_root[root] = driven.len();
                driven.push(self.drivers[root].is_some());
                if let Some(Driver::Constant(level)) = self.drivers[root] {
                    constants.push((node_of_root[root], level));
                }
            }
            node_of.push(node_of_root[root]);
        }

        let gates = self
            .gates
            .iter()
            .map(|gate| NodeGate {
                a: node_of[gate.a.index()],
                b: node_of[gate.b.index()],
                output: node_of[gate.output.index()],
            })
            .collect::<Vec<_>>();
        let cells = self
            .cells
            .iter()
            .map(|cell| NodeCell {
                data: node_of[cell.data.index()],
                clear: cell.clear.map(|clear| node_of[clear.index()]),
                output: node_of[cell.output.index()],
            })
            .collect::<Vec<_>>();

        debug!(
            wires = self.parent.len(),
            nodes = driven.len(),
            gates = gates.len(),
            cells = cells.len(),
            "netlist frozen"
        );

        Ok(Network {
            node_of,
            driven,
            gates,
            cells,
            constants,
            names: self.names,
        })
    }
}

/// NAND gate over dense node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeGate {
    pub(crate) a: usize,
    pub(crate) b: usize,
    pub(crate) output: usize,
}

/// Storage cell over dense node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeCell {
    pub(crate) data: usize,
    pub(crate) clear: Option<usize>,
    pub(crate) output: usize,
}

/// Frozen, structurally immutable circuit.
#[derive(Debug, Clone)]
pub struct Network {
    node_of: Vec<usize>,
    driven: Vec<bool>,
    pub(crate) gates: Vec<NodeGate>,
    pub(crate) cells: Vec<NodeCell>,
    pub(crate) constants: Vec<(usize, bool)>,
    names: BTreeMap<String, WireId>,
}

impl Network {
    /// Number of electrical nodes after connection merging.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.driven.len()
    }

    /// Number of NAND gates.
    #[must_use]
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Number of storage cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Resolves a wire to its node index.
    ///
    /// # Panics
    ///
    /// Panics when `wire` was not allocated by the netlist this network was
    /// frozen from.
    #[must_use]
    pub fn node(&self, wire: WireId) -> usize {
        self.node_of[wire.index()]
    }

    /// Resolves a wire to its node index, or `None` for a wire from another
    /// netlist.
    #[must_use]
    pub fn try_node(&self, wire: WireId) -> Option<usize> {
        self.node_of.get(wire.index()).copied()
    }

    /// Returns `true` when the wire's node has a gate, cell or constant driver.
    ///
    /// # Panics
    ///
    /// Panics on a wire from another netlist, as [`Network::node`].
    #[must_use]
    pub fn is_driven(&self, wire: WireId) -> bool {
        self.driven[self.node(wire)]
    }

    /// Looks up a named wire.
    #[must_use]
    pub fn wire_named(&self, name: &str) -> Option<WireId> {
        self.names.get(name).copied()
    }

    /// Iterates over all wire names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = (&str, WireId)> {
        self.names.iter().map(|(name, wire)| (name.as_str(), *wire))
    }
}
