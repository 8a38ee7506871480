//! Quota data types parsed from the companion's `GetUserStatus` response.

use serde::Serialize;

/// A single model inside a quota pool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    /// Display label (e.g., "Claude Sonnet 4.5")
    pub label: String,
    /// Remaining quota percentage (0-100)
    pub remaining_pct: f64,
    /// Whether the model has no allowance left, regardless of percentage
    pub exhausted: bool,
}

/// A group of models sharing one quota allowance and reset cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pool {
    /// Stable identifier (e.g., "gemini3", "claude_gpt")
    pub id: String,
    /// Human display name (e.g., "Gemini 3.x")
    pub display_name: String,
    /// Remaining quota percentage (0-100)
    pub remaining_pct: f64,
    /// Human-readable time until the allowance resets (e.g., "2h 15m")
    pub time_until_reset: String,
    /// Models in arrival order
    pub models: Vec<Model>,
}

/// One complete fetch result. Replaced wholesale by the next fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuotaSnapshot {
    /// Pools in arrival order
    pub pools: Vec<Pool>,
}

impl QuotaSnapshot {
    /// Create a snapshot from already-ordered pools
    pub fn new(pools: Vec<Pool>) -> Self {
        Self { pools }
    }

    /// Check if the companion reported no pools at all
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
