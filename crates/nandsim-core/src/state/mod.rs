//! Host-observable state of a running simulation.

/// Run-state machine for fault latching.
pub mod run_state;

pub use run_state::RunState;
