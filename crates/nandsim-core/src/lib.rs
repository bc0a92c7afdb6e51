//! Gate-level NAND network simulator and the 3-bit CPU built on it.

/// Wire graph, NAND gates, storage cells and the frozen network.
pub mod netlist;
pub use netlist::{CellId, CellSpec, Driver, Nand, Netlist, NetlistError, Network, WireId};

/// Boolean operators built from NAND.
pub mod gates;

/// Edge-sampled storage cells.
pub mod storage;

/// Settlement and edge advance.
pub mod simulation;
pub use simulation::Simulation;

/// Simulation driver configuration.
pub mod config;
pub use config::{SimConfig, SETTLE_PASS_FLOOR};

/// Error taxonomy shared by construction and simulation.
pub mod fault;
pub use fault::{ErrorClass, SimError};

/// Run-state of a simulation.
pub mod state;
pub use state::RunState;

/// Instruction word layout and control truth table.
pub mod encoding;
pub use encoding::{
    bits_to_value, format_msb_first, word_to_bits, ControlSignals, Instruction, Opcode, Register,
    IMMEDIATE_MASK, MEMORY_WORDS, WORD_BITS, WORD_MASK,
};

/// ROM contents.
pub mod image;
pub use image::{ImageError, MemoryImage};

/// Composite functional units.
pub mod units;
pub use units::{AluOutputs, DecoderOutputs};

/// The assembled CPU.
pub mod computer;
pub use computer::{CircuitError, Computer, Ports, Snapshot};

/// Behavioural instruction-set model.
pub mod reference;
pub use reference::ReferenceCpu;

/// ROM disassembly.
pub mod disasm;
pub use disasm::{disassemble_image, disassemble_word, DisassemblyRow};

#[cfg(test)]
use proptest as _;
