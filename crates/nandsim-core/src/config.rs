//! Simulation driver configuration.

/// Minimum settlement pass bound, applied even to tiny networks.
pub const SETTLE_PASS_FLOOR: usize = 16;

/// Top-level immutable configuration for a simulation instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SimConfig {
    /// Maximum number of full settlement passes before a network is declared
    /// oscillating. `None` derives the bound from the gate count.
    pub max_settle_passes: Option<usize>,
}

impl SimConfig {
    /// Returns the pass bound for a network with `gate_count` NAND gates.
    ///
    /// Gauss-Seidel evaluation of an acyclic network needs at most one pass
    /// per gate plus a final quiet pass, so the derived bound is
    /// `2 * gate_count + SETTLE_PASS_FLOOR`.
    #[must_use]
    pub fn settle_bound(&self, gate_count: usize) -> usize {
        self.max_settle_passes.map_or_else(
            || gate_count.saturating_mul(2).saturating_add(SETTLE_PASS_FLOOR),
            |passes| passes.max(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{SimConfig, SETTLE_PASS_FLOOR};

    #[test]
    fn default_bound_scales_with_gate_count() {
        let config = SimConfig::default();
        assert_eq!(config.settle_bound(0), SETTLE_PASS_FLOOR);
        assert_eq!(config.settle_bound(100), 200 + SETTLE_PASS_FLOOR);
    }

    #[test]
    fn explicit_bound_is_used_but_never_zero() {
        let config = SimConfig {
            max_settle_passes: Some(5),
        };
        assert_eq!(config.settle_bound(10_000), 5);

        let zero = SimConfig {
            max_settle_passes: Some(0),
        };
        assert_eq!(zero.settle_bound(3), 1);
    }
}
