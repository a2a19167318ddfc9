use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the next enumeration pass should run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassPlan {
    /// Not enough time left for a large frontier.
    Skip,
    /// Enumerate a capped prefix of the frontier and take one fact.
    Bounded,
    /// Enumerate the whole frontier.
    Full,
}

/// Wall-clock allowance for a whole game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeBudget {
    pub total: Duration,
    /// Time kept in reserve; below it only small frontiers are enumerated.
    pub floor: Duration,
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self {
            total: Duration::from_secs(180),
            floor: Duration::from_secs(5),
        }
    }
}

impl TimeBudget {
    /// Picks a pass mode from the time used so far and the slowest full pass
    /// seen in this game.
    pub fn plan(
        &self,
        elapsed: Duration,
        frontier_len: usize,
        bounded_cap: usize,
        max_pass_cost: Duration,
    ) -> PassPlan {
        let remaining = self.total.saturating_sub(elapsed);

        if remaining < self.floor && frontier_len > bounded_cap {
            PassPlan::Skip
        } else if remaining < self.floor + max_pass_cost.mul_f64(1.5) {
            PassPlan::Bounded
        } else {
            PassPlan::Full
        }
    }
}
