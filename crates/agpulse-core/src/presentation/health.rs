//! Health classification of remaining-quota percentages.

use crate::quota::Model;

/// Above this a pool is healthy
pub const HEALTHY_ABOVE: f64 = 50.0;

/// At or below this a pool is critical
pub const CRITICAL_AT_OR_BELOW: f64 = 20.0;

/// Three-tier health of a remaining-quota percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    /// More than 50% left
    Healthy,
    /// More than 20% and at most 50% left
    Warning,
    /// 20% or less left (or exhausted)
    Critical,
}

impl Health {
    /// Classify a remaining percentage
    pub fn classify(remaining_pct: f64) -> Self {
        if remaining_pct > HEALTHY_ABOVE {
            Health::Healthy
        } else if remaining_pct > CRITICAL_AT_OR_BELOW {
            Health::Warning
        } else {
            Health::Critical
        }
    }

    /// Colored dot for this health level
    pub fn icon(&self) -> &'static str {
        match self {
            Health::Healthy => "🟢",
            Health::Warning => "🟡",
            Health::Critical => "🔴",
        }
    }
}

/// Classify a model; the exhausted flag wins over the percentage
pub fn model_health(model: &Model) -> Health {
    if model.exhausted {
        Health::Critical
    } else {
        Health::classify(model.remaining_pct)
    }
}

/// Icon for a model line.
///
/// Models use a four-icon set: exhausted is red, low is yellow, and anything
/// else stays neutral so the pool header keeps the visual weight.
pub fn model_icon(model: &Model) -> &'static str {
    match model_health(model) {
        Health::Critical if model.exhausted => "🔴",
        Health::Critical => "🟡",
        Health::Warning | Health::Healthy => "⚪",
    }
}
