use crate::SimError;

/// Execution state of a [`crate::Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// Settled and ready for the next edge advance.
    #[default]
    Ready,
    /// A settlement failure is latched; only `init` makes further progress.
    FaultLatched(SimError),
}

impl RunState {
    /// Returns the latched fault, if any.
    #[must_use]
    pub const fn latched_fault(self) -> Option<SimError> {
        match self {
            Self::FaultLatched(cause) => Some(cause),
            Self::Ready => None,
        }
    }

    /// Returns `true` when `update` and `tick` may run.
    #[must_use]
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::SimError;

    #[test]
    fn run_state_default_is_ready() {
        assert_eq!(RunState::default(), RunState::Ready);
        assert!(RunState::default().is_ready());
    }

    #[test]
    fn latched_fault_accessor_reports_only_fault_latched_variant() {
        let cause = SimError::Oscillation { passes: 8 };
        assert_eq!(RunState::Ready.latched_fault(), None);
        assert_eq!(RunState::FaultLatched(cause).latched_fault(), Some(cause));
        assert!(!RunState::FaultLatched(cause).is_ready());
    }
}
