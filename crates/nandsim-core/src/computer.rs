//! The 3-bit CPU assembled from composite units.
//!
//! Datapath, per edge:
//!
//! ```text
//!   PC ──► ROM ──┬─ bits 3..0 ──────────────► ALU.a
//!                └─ bits 6..4 ─► decoder ─┬─► ALU.mode
//!   A, B ─► selector(sel) ─────────────────┼─► ALU.b
//!   ALU.sum ─► A, B, PC (gated by load_a, load_b, load_pc)
//!   ALU.carry ─► carry flag ─► decoder
//! ```

use thiserror::Error;
use tracing::debug;

use crate::config::SimConfig;
use crate::encoding::{
    bits_to_value, format_msb_first, Instruction, MEMORY_WORDS, WORD_BITS,
};
use crate::fault::{ErrorClass, SimError};
use crate::image::{ImageError, MemoryImage};
use crate::netlist::{Netlist, NetlistError, Network, WireId};
use crate::simulation::{start, Simulation};
use crate::units::DecoderOutputs;

/// Failures while constructing a [`Computer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// The CPU netlist could not be wired.
    #[error(transparent)]
    Netlist(#[from] NetlistError),
    /// The memory image was rejected.
    #[error(transparent)]
    Image(#[from] ImageError),
    /// The reset state failed to settle.
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl CircuitError {
    /// Returns the error class of the underlying failure.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Netlist(err) => err.class(),
            Self::Image(err) => err.class(),
            Self::Sim(err) => err.class(),
        }
    }
}

/// Observable wires of the assembled CPU, low-order bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ports {
    /// Register A outputs.
    pub register_a: [WireId; 4],
    /// Register B outputs.
    pub register_b: [WireId; 4],
    /// Program counter outputs.
    pub program_counter: [WireId; 3],
    /// Carry flag output.
    pub carry: WireId,
    /// Shared clear line of both registers and the counter.
    pub clear: WireId,
    /// Word currently fetched from ROM.
    pub instruction: [WireId; WORD_BITS],
    /// Constant-driven ROM words.
    pub memory: [[WireId; WORD_BITS]; MEMORY_WORDS],
    /// Decoder control lines.
    pub controls: DecoderOutputs,
}

/// Builds the CPU netlist for `image`.
///
/// # Errors
///
/// Propagates [`NetlistError`] from closing feedback loops.
pub fn build(image: &MemoryImage) -> Result<(Network, Ports), NetlistError> {
    let mut net = Netlist::new();

    let clear = net.wire();
    let a_in = net.wires::<4>();
    let b_in = net.wires::<4>();
    let pc_in = net.wires::<3>();
    let a_load = net.wire();
    let b_load = net.wire();
    let pc_load = net.wire();
    let carry_in = net.wire();

    let register_a = net.register4(a_in, a_load, clear)?;
    let register_b = net.register4(b_in, b_load, clear)?;
    let program_counter = net.counter3(pc_in, pc_load, clear)?;
    let carry = net.carry_flag(carry_in);

    let memory = image
        .words()
        .map(|word| word.map(|level| net.constant(level)));
    let instruction = net.rom(&memory, program_counter);
    let immediate = [instruction[0], instruction[1], instruction[2], instruction[3]];
    let opcode = [instruction[4], instruction[5], instruction[6]];

    let controls = net.decoder(opcode, carry);
    net.connect(controls.load_a, a_load)?;
    net.connect(controls.load_b, b_load)?;
    net.connect(controls.load_pc, pc_load)?;

    let operand = net.selector4(register_a, register_b, controls.select);
    let alu = net.alu4(immediate, operand, controls.alu_mode);
    net.connect(alu.carry, carry_in)?;
    for (bit, sum) in alu.sum.into_iter().enumerate() {
        net.connect(sum, a_in[bit])?;
        net.connect(sum, b_in[bit])?;
        if let Some(pc) = pc_in.get(bit) {
            net.connect(sum, *pc)?;
        }
    }

    net.name_bus(&register_a, "a")?;
    net.name_bus(&register_b, "b")?;
    net.name_bus(&program_counter, "pc")?;
    net.name_bus(&instruction, "ir")?;
    net.name(carry, "carry")?;
    net.name(clear, "clear")?;
    net.name(controls.load_a, "load_a")?;
    net.name(controls.load_b, "load_b")?;
    net.name(controls.load_pc, "load_pc")?;
    net.name(controls.alu_mode, "alu_mode")?;
    net.name(controls.select, "select")?;

    let network = net.freeze()?;
    debug!(
        gates = network.gate_count(),
        cells = network.cell_count(),
        nodes = network.node_count(),
        "cpu netlist built"
    );

    let ports = Ports {
        register_a,
        register_b,
        program_counter,
        carry,
        clear,
        instruction,
        memory,
        controls,
    };
    Ok((network, ports))
}

/// Point-in-time view of the CPU, low-order bit first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Snapshot {
    /// Edge advances since the last `init`.
    pub ticks: u64,
    /// Register A.
    pub register_a: [bool; 4],
    /// Register B.
    pub register_b: [bool; 4],
    /// Program counter.
    pub program_counter: [bool; 3],
    /// Carry flag.
    pub carry: bool,
    /// ROM contents.
    pub memory: [[bool; WORD_BITS]; MEMORY_WORDS],
}

impl Snapshot {
    /// Register A as an integer.
    #[must_use]
    pub fn a(&self) -> u8 {
        bits_to_value(&self.register_a)
    }

    /// Register B as an integer.
    #[must_use]
    pub fn b(&self) -> u8 {
        bits_to_value(&self.register_b)
    }

    /// Program counter as an integer.
    #[must_use]
    pub fn pc(&self) -> u8 {
        bits_to_value(&self.program_counter)
    }

    /// Word at `address` as an integer.
    #[must_use]
    pub fn word(&self, address: usize) -> u8 {
        bits_to_value(&self.memory[address % MEMORY_WORDS])
    }

    /// Instruction the program counter currently points at.
    #[must_use]
    pub fn current_instruction(&self) -> Instruction {
        Instruction::decode(self.word(usize::from(self.pc())))
    }

    /// Register A, most significant bit first.
    #[must_use]
    pub fn a_msb_first(&self) -> String {
        format_msb_first(&self.register_a)
    }

    /// Register B, most significant bit first.
    #[must_use]
    pub fn b_msb_first(&self) -> String {
        format_msb_first(&self.register_b)
    }

    /// Program counter, most significant bit first.
    #[must_use]
    pub fn pc_msb_first(&self) -> String {
        format_msb_first(&self.program_counter)
    }

    /// Word at `address`, most significant bit first.
    #[must_use]
    pub fn word_msb_first(&self, address: usize) -> String {
        format_msb_first(&self.memory[address % MEMORY_WORDS])
    }
}

/// A gate-level CPU bound to its simulation.
#[derive(Debug, Clone)]
pub struct Computer {
    sim: Simulation,
    ports: Ports,
    image: MemoryImage,
}

impl Computer {
    /// Builds and initialises a CPU running `image`.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError`] when wiring or the reset settlement fails.
    pub fn new(image: &MemoryImage) -> Result<Self, CircuitError> {
        Self::with_config(image, &SimConfig::default())
    }

    /// Builds and initialises a CPU with an explicit simulation config.
    ///
    /// # Errors
    ///
    /// Same as [`Computer::new`].
    pub fn with_config(image: &MemoryImage, config: &SimConfig) -> Result<Self, CircuitError> {
        let (network, ports) = build(image)?;
        let sim = start(network, config)?;
        Ok(Self {
            sim,
            ports,
            image: *image,
        })
    }

    /// Validates per-word bit tokens (bit 0 first) and builds a CPU.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitError::Image`] for a malformed image, otherwise as
    /// [`Computer::new`].
    pub fn from_bits<W: AsRef<[u8]>>(words: &[W]) -> Result<Self, CircuitError> {
        let image = MemoryImage::from_bits(words)?;
        Self::new(&image)
    }

    /// Resets all state low and settles.
    ///
    /// # Errors
    ///
    /// Propagates settlement failure.
    pub fn init(&mut self) -> Result<usize, SimError> {
        self.sim.init()
    }

    /// Settles the combinational network without an edge.
    ///
    /// # Errors
    ///
    /// Propagates settlement failure or a latched fault.
    pub fn update(&mut self) -> Result<usize, SimError> {
        self.sim.update()
    }

    /// Executes one instruction: one edge advance plus settlement.
    ///
    /// # Errors
    ///
    /// Propagates settlement failure or a latched fault.
    pub fn tick(&mut self) -> Result<usize, SimError> {
        self.sim.tick()
    }

    /// Drives the shared clear line. Takes effect on the next edge.
    ///
    /// # Errors
    ///
    /// Propagates settlement failure or a latched fault.
    pub fn set_clear(&mut self, level: bool) -> Result<(), SimError> {
        self.sim.set(self.ports.clear, level)?;
        let _ = self.sim.update()?;
        Ok(())
    }

    /// Register A as an integer.
    #[must_use]
    pub fn register_a(&self) -> u8 {
        bits_to_value(&self.sim.bits(&self.ports.register_a))
    }

    /// Register B as an integer.
    #[must_use]
    pub fn register_b(&self) -> u8 {
        bits_to_value(&self.sim.bits(&self.ports.register_b))
    }

    /// Program counter as an integer.
    #[must_use]
    pub fn program_counter(&self) -> u8 {
        bits_to_value(&self.sim.bits(&self.ports.program_counter))
    }

    /// Carry flag level.
    #[must_use]
    pub fn carry(&self) -> bool {
        self.sim.get(self.ports.carry)
    }

    /// Instruction currently fetched by the ROM.
    #[must_use]
    pub fn instruction(&self) -> Instruction {
        Instruction::decode(bits_to_value(&self.sim.bits(&self.ports.instruction)))
    }

    /// Captures all observable state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            ticks: self.sim.ticks(),
            register_a: self.sim.bits(&self.ports.register_a),
            register_b: self.sim.bits(&self.ports.register_b),
            program_counter: self.sim.bits(&self.ports.program_counter),
            carry: self.carry(),
            memory: self.ports.memory.map(|word| self.sim.bits(&word)),
        }
    }

    /// Wires exposed by the assembled CPU.
    #[must_use]
    pub const fn ports(&self) -> &Ports {
        &self.ports
    }

    /// Image the ROM was built from.
    #[must_use]
    pub const fn image(&self) -> &MemoryImage {
        &self.image
    }

    /// Underlying simulation, for probing named wires.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }
}
