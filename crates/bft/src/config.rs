//! View-change processing configuration.

use serde::{Deserialize, Serialize};

/// What to do when a proof's counter is not a valid committee index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterOverflowPolicy {
    /// Reduce the counter modulo the committee size and continue.
    ///
    /// Logged as a warning: it usually means this node's committee view has
    /// drifted from the proposer's.
    #[default]
    Wrap,

    /// Reject the proof.
    Reject,
}

/// Configuration for view-change proof processing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewChangeConfig {
    /// Handling of counters at or beyond the committee size.
    pub counter_overflow: CounterOverflowPolicy,
}

impl ViewChangeConfig {
    /// Create a config with an explicit overflow policy.
    pub fn with_counter_overflow(counter_overflow: CounterOverflowPolicy) -> Self {
        Self { counter_overflow }
    }

    /// Create a config that rejects out-of-range counters.
    pub fn strict() -> Self {
        Self::with_counter_overflow(CounterOverflowPolicy::Reject)
    }
}
