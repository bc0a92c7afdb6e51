//! Terminal front end for the gate-level 3-bit CPU.

#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;

/// Clock driving loop for automatic and manual ticking.
pub mod driver;
/// Structured load and front-end error types.
pub mod errors;
/// Text memory image loader.
pub mod image;
/// Mnemonic parsing against the core opcode table.
pub mod mnemonic;
/// Register and memory panel rendering.
pub mod render;
