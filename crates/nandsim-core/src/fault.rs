use thiserror::Error;

use crate::netlist::WireId;

/// Error classes used to decide whether a failure is the circuit's fault or
/// the caller's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorClass {
    /// The circuit itself is ill-formed (oscillation, conflicting drivers).
    MalformedCircuit,
    /// Caller-supplied data was rejected before or during simulation.
    MalformedInput,
}

/// Runtime failures of the simulation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SimError {
    /// Settlement did not reach a fixpoint within the pass bound.
    #[error("network did not settle within {passes} passes")]
    Oscillation {
        /// Pass bound that was exhausted.
        passes: usize,
    },
    /// An earlier settlement failure poisoned this simulation.
    #[error("simulation is latched after a settlement failure; init is required")]
    FaultLatched,
    /// Test injection targeted a node that already has a driver.
    #[error("wire {0} is driven and cannot be set directly")]
    DrivenWire(WireId),
    /// Test injection named a wire from another netlist.
    #[error("wire {0} does not belong to this network")]
    UnknownWire(WireId),
}

impl SimError {
    /// Returns the error class for this failure.
    #[must_use]
    pub const fn class(self) -> ErrorClass {
        match self {
            Self::Oscillation { .. } | Self::FaultLatched => ErrorClass::MalformedCircuit,
            Self::DrivenWire(_) | Self::UnknownWire(_) => ErrorClass::MalformedInput,
        }
    }

    /// Faults that leave the simulation unusable until `init`.
    #[must_use]
    pub const fn is_latching(self) -> bool {
        matches!(self, Self::Oscillation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorClass, SimError};
    use crate::Netlist;

    #[test]
    fn oscillation_is_a_latching_circuit_fault() {
        let fault = SimError::Oscillation { passes: 32 };
        assert!(fault.is_latching());
        assert_eq!(fault.class(), ErrorClass::MalformedCircuit);
        assert_eq!(
            fault.to_string(),
            "network did not settle within 32 passes"
        );
    }

    #[test]
    fn driven_wire_injection_is_an_input_error() {
        let wire = Netlist::new().wire();
        let fault = SimError::DrivenWire(wire);
        assert!(!fault.is_latching());
        assert_eq!(fault.class(), ErrorClass::MalformedInput);
        assert!(!SimError::FaultLatched.is_latching());
    }
}
