use serde::{Deserialize, Serialize};

use crate::TimeBudget;

/// Frontier size up to which exhaustive search stays affordable.
pub const DEFAULT_BOUNDED_CAP: usize = 39;

pub const DEFAULT_ASSIGNMENT_LIMIT: usize = 1_000_000;

/// What to reveal when nothing is provably safe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackStrategy {
    /// The standing lowest-risk cell from enumeration, if any.
    LowestRisk,
    /// The first frontier cell in row-major order.
    FirstFrontier,
}

impl Default for FallbackStrategy {
    fn default() -> Self {
        Self::LowestRisk
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub time_budget: TimeBudget,
    pub bounded_cap: usize,
    pub assignment_limit: usize,
    pub fallback: FallbackStrategy,
    /// Report flags to the host as actions instead of keeping them internal.
    pub emit_flags: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            time_budget: TimeBudget::default(),
            bounded_cap: DEFAULT_BOUNDED_CAP,
            assignment_limit: DEFAULT_ASSIGNMENT_LIMIT,
            fallback: FallbackStrategy::default(),
            emit_flags: false,
        }
    }
}
