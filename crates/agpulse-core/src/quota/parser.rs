//! Parse the companion's `GetUserStatus` JSON into a [`QuotaSnapshot`].
//!
//! The upstream payload is a flat list of model configs. Models that share
//! an allowance are grouped into pools here:
//!
//! ```text
//! { "userStatus": { "cascadeModelConfigData": { "clientModelConfigs": [
//!     { "label": "Gemini 3 Pro (High)",
//!       "modelOrAlias": { "model": "MODEL_PLACEHOLDER_M7" },
//!       "quotaInfo": { "remainingFraction": 0.85,
//!                      "resetTime": "2025-11-20T10:00:00Z" } },
//!     ...
//! ] } } }
//! ```
//!
//! The walk is deliberately value-based: one malformed entry degrades to
//! defaults instead of failing the whole snapshot.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::{Model, Pool, QuotaSnapshot};
use crate::error::FetchError;

/// Pools the companion's models are grouped into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    /// Gemini 3.x family
    Gemini3,
    /// Claude and GPT models (shared third-party allowance)
    ClaudeGpt,
    /// Gemini 2.5 family
    Gemini25,
    /// Anything not recognised
    Other,
}

impl PoolKind {
    /// Classify a model by its label, falling back to the model identifier
    pub fn classify(label: &str, model_id: &str) -> Self {
        let haystack = format!("{} {}", label, model_id).to_lowercase();
        if haystack.contains("claude") || haystack.contains("gpt") {
            PoolKind::ClaudeGpt
        } else if haystack.contains("gemini 3") || haystack.contains("gemini-3") {
            PoolKind::Gemini3
        } else if haystack.contains("gemini 2.5") || haystack.contains("gemini-2.5") {
            PoolKind::Gemini25
        } else {
            PoolKind::Other
        }
    }

    /// Stable pool identifier
    pub fn id(&self) -> &'static str {
        match self {
            PoolKind::Gemini3 => "gemini3",
            PoolKind::ClaudeGpt => "claude_gpt",
            PoolKind::Gemini25 => "gemini2.5",
            PoolKind::Other => "other",
        }
    }

    /// Full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            PoolKind::Gemini3 => "Gemini 3.x",
            PoolKind::ClaudeGpt => "Claude / GPT",
            PoolKind::Gemini25 => "Gemini 2.5",
            PoolKind::Other => "Other",
        }
    }
}

/// Pool under construction while walking the model list
struct PoolAccumulator {
    kind: PoolKind,
    models: Vec<Model>,
    earliest_reset: Option<DateTime<Utc>>,
}

impl PoolAccumulator {
    fn finish(self, now: DateTime<Utc>) -> Pool {
        // Exhausted models are flagged on their own; they do not pin the pool at 0
        let remaining_pct = self
            .models
            .iter()
            .filter(|m| !m.exhausted)
            .map(|m| m.remaining_pct)
            .fold(f64::INFINITY, f64::min);
        Pool {
            id: self.kind.id().to_string(),
            display_name: self.kind.display_name().to_string(),
            remaining_pct: if remaining_pct.is_finite() {
                remaining_pct
            } else {
                0.0
            },
            time_until_reset: format_reset(self.earliest_reset, now),
            models: self.models,
        }
    }
}

/// Parse a `GetUserStatus` response body.
///
/// Fails only when the body is not a JSON object. Missing nested objects
/// yield an empty snapshot; malformed per-model fields are coerced.
pub fn parse_user_status(body: &[u8], now: DateTime<Utc>) -> Result<QuotaSnapshot, FetchError> {
    let root: Value = serde_json::from_slice(body)?;
    if !root.is_object() {
        return Err(FetchError::Decode(
            "top-level payload is not an object".to_string(),
        ));
    }

    let configs = root
        .pointer("/userStatus/cascadeModelConfigData/clientModelConfigs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut pools: Vec<PoolAccumulator> = Vec::new();

    for config in configs.iter().filter(|c| c.is_object()) {
        let model_id = config
            .pointer("/modelOrAlias/model")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let label = config
            .get("label")
            .and_then(Value::as_str)
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(if model_id.is_empty() { "Unknown" } else { model_id })
            .to_string();

        let fraction = coerce_fraction(config.pointer("/quotaInfo/remainingFraction"));
        let reset = config
            .pointer("/quotaInfo/resetTime")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let kind = PoolKind::classify(&label, model_id);
        let model = Model {
            label,
            remaining_pct: (fraction.unwrap_or(0.0) * 100.0).clamp(0.0, 100.0),
            exhausted: fraction.is_none_or(|f| f <= 0.0),
        };

        let idx = match pools.iter().position(|p| p.kind == kind) {
            Some(idx) => idx,
            None => {
                pools.push(PoolAccumulator {
                    kind,
                    models: Vec::new(),
                    earliest_reset: None,
                });
                pools.len() - 1
            }
        };
        let pool = &mut pools[idx];
        pool.models.push(model);
        pool.earliest_reset = match (pool.earliest_reset, reset) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
    }

    Ok(QuotaSnapshot::new(
        pools.into_iter().map(|p| p.finish(now)).collect(),
    ))
}

/// Accept a remaining fraction given as a number or a numeric string
fn coerce_fraction(value: Option<&Value>) -> Option<f64> {
    let fraction = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    fraction.is_finite().then_some(fraction)
}

/// Render the time until `reset` as a compact duration ("2h 15m", "3d 4h")
pub fn format_reset(reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(reset) = reset else {
        return "unknown".to_string();
    };
    let minutes = (reset - now).num_minutes();
    if minutes <= 0 {
        return "now".to_string();
    }
    let (days, hours, mins) = (minutes / 1440, (minutes % 1440) / 60, minutes % 60);
    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
