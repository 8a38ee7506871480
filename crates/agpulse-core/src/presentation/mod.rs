//! Pure derivation of what the display surface shows for a [`DisplayState`].
//!
//! Nothing here has side effects: the same state always yields the same
//! [`Representation`].

mod detail;
mod health;

pub use detail::{DetailBlock, DetailView, Segment};
pub use health::{model_health, model_icon, Health, CRITICAL_AT_OR_BELOW, HEALTHY_ABOVE};

use serde::Serialize;

use crate::monitor::DisplayState;
use crate::quota::{Pool, QuotaSnapshot};

/// Number of cells in the visual quota bar
pub const BAR_CELLS: usize = 20;

/// Separator between compact pool tokens
pub const COMPACT_SEPARATOR: &str = " | ";

/// Compact text while discovering/fetching
pub const LOADING_TEXT: &str = "⟳ AG";

/// Compact text in the error state
pub const ERROR_TEXT: &str = "✖ AG";

/// Compact text when the companion reports no pools
pub const EMPTY_TEXT: &str = "🚀 AG";

/// Name shown in sentinel detail messages
const PRODUCT_NAME: &str = "Antigravity Pulse";

/// Footer of the detail view; activating the surface refreshes
pub const REFRESH_HINT: &str = "Click to refresh";

/// Everything the display surface needs for one state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Representation {
    /// One-line indicator text
    pub compact_text: String,
    /// On-demand detail payload
    pub detail: DetailView,
    /// Whether the indicator should use the alert background
    pub alert: bool,
}

/// Derive the representation of a display state
pub fn derive(state: &DisplayState) -> Representation {
    match state {
        DisplayState::Loading => Representation {
            compact_text: LOADING_TEXT.to_string(),
            detail: DetailView::message(format!("{}: detecting process…", PRODUCT_NAME)),
            alert: false,
        },
        DisplayState::Error(message) => Representation {
            compact_text: ERROR_TEXT.to_string(),
            detail: DetailView::message(format!("{}: {}", PRODUCT_NAME, message)),
            alert: true,
        },
        DisplayState::Ready(snapshot) if snapshot.is_empty() => Representation {
            compact_text: EMPTY_TEXT.to_string(),
            detail: DetailView::message(format!("{}: no data yet", PRODUCT_NAME)),
            alert: false,
        },
        DisplayState::Ready(snapshot) => Representation {
            compact_text: compact_text(snapshot),
            detail: detail_view(snapshot),
            alert: false,
        },
    }
}

/// Abbreviated pool label for the compact indicator
pub fn short_label(pool_id: &str) -> &str {
    match pool_id {
        "gemini3" => "Gemini",
        "claude_gpt" => "Claude",
        "gemini2.5" => "Gemini 2.5",
        "other" => "Other",
        unknown => unknown,
    }
}

/// Percentage rounded to a whole number
fn whole_percent(pct: f64) -> i64 {
    pct.round() as i64
}

/// One token per pool, in snapshot order: "🟢 Gemini 85% | 🔴 Claude 15%"
pub fn compact_text(snapshot: &QuotaSnapshot) -> String {
    snapshot
        .pools
        .iter()
        .map(|pool| {
            format!(
                "{} {} {}%",
                Health::classify(pool.remaining_pct).icon(),
                short_label(&pool.id),
                whole_percent(pool.remaining_pct)
            )
        })
        .collect::<Vec<_>>()
        .join(COMPACT_SEPARATOR)
}

/// Fixed-width bar: `round(pct / 100 * BAR_CELLS)` filled cells
pub fn visual_bar(pct: f64) -> String {
    let filled = ((pct / 100.0) * BAR_CELLS as f64)
        .round()
        .clamp(0.0, BAR_CELLS as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

/// Header, bar, and optional model lines for one pool
fn pool_blocks(pool: &Pool) -> Vec<DetailBlock> {
    let health = Health::classify(pool.remaining_pct);
    let mut blocks = vec![
        DetailBlock::line(vec![
            Segment::strong(format!("{} {}", health.icon(), pool.display_name)),
            Segment::text(format!(" — {}%", whole_percent(pool.remaining_pct))),
        ]),
        DetailBlock::line(vec![
            Segment::code(visual_bar(pool.remaining_pct)),
            Segment::text(" resets in "),
            Segment::strong(pool.time_until_reset.clone()),
        ]),
    ];

    if pool.models.len() > 1 {
        blocks.extend(pool.models.iter().map(|model| {
            DetailBlock::nested(vec![Segment::text(format!(
                "{} {} — {}%",
                model_icon(model),
                model.label,
                whole_percent(model.remaining_pct)
            ))])
        }));
    }

    blocks
}

/// Full breakdown with dividers between pools and a refresh action
pub fn detail_view(snapshot: &QuotaSnapshot) -> DetailView {
    let mut blocks = vec![DetailBlock::Heading {
        text: "Antigravity Quota".to_string(),
    }];

    for (i, pool) in snapshot.pools.iter().enumerate() {
        if i > 0 {
            blocks.push(DetailBlock::Divider);
        }
        blocks.extend(pool_blocks(pool));
    }

    blocks.push(DetailBlock::Divider);
    blocks.push(DetailBlock::line(vec![Segment::emphasis(REFRESH_HINT)]));

    DetailView { blocks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::Model;
    use pretty_assertions::assert_eq;

    fn model(label: &str, pct: f64, exhausted: bool) -> Model {
        Model {
            label: label.to_string(),
            remaining_pct: pct,
            exhausted,
        }
    }

    fn scenario() -> QuotaSnapshot {
        QuotaSnapshot::new(vec![
            Pool {
                id: "gemini3".to_string(),
                display_name: "Gemini 3.x".to_string(),
                remaining_pct: 85.0,
                time_until_reset: "2h 15m".to_string(),
                models: vec![model("Gemini 3 Pro (High)", 85.0, false)],
            },
            Pool {
                id: "claude_gpt".to_string(),
                display_name: "Claude / GPT".to_string(),
                remaining_pct: 15.0,
                time_until_reset: "45m".to_string(),
                models: vec![
                    model("Claude Sonnet 4.5", 15.0, false),
                    model("GPT-OSS 120B", 0.0, true),
                ],
            },
        ])
    }

    #[test]
    fn test_scenario_compact_text() {
        let repr = derive(&DisplayState::Ready(scenario()));
        let tokens: Vec<&str> = repr.compact_text.split(COMPACT_SEPARATOR).collect();
        assert_eq!(tokens, vec!["🟢 Gemini 85%", "🔴 Claude 15%"]);
        assert!(!repr.alert);
    }

    #[test]
    fn test_scenario_detail_view() {
        let repr = derive(&DisplayState::Ready(scenario()));
        let markdown = repr.detail.to_markdown();

        assert!(markdown.contains("**🟢 Gemini 3.x** — 85%"));
        assert!(markdown.contains("**🔴 Claude / GPT** — 15%"));
        assert!(markdown.contains("resets in **45m**"));
        // Only the multi-model pool lists its models
        assert!(!markdown.contains("Gemini 3 Pro (High)"));
        assert!(markdown.contains("&nbsp;&nbsp;&nbsp;🟡 Claude Sonnet 4.5 — 15%"));
        assert!(markdown.contains("&nbsp;&nbsp;&nbsp;🔴 GPT-OSS 120B — 0%"));
        // One divider between the pools, one before the footer
        assert_eq!(repr.detail.divider_count(), 2);
        assert!(markdown.ends_with("_Click to refresh_\n\n"));
    }

    #[test]
    fn test_single_model_pool_has_no_model_lines() {
        let mut snapshot = scenario();
        snapshot.pools.truncate(1);
        let view = detail_view(&snapshot);
        let nested = view
            .blocks
            .iter()
            .filter(|b| matches!(b, DetailBlock::Line { nested: true, .. }))
            .count();
        assert_eq!(nested, 0);
        assert_eq!(view.divider_count(), 1);
    }

    #[test]
    fn test_token_count_matches_pool_count() {
        let mut snapshot = scenario();
        snapshot.pools.push(Pool {
            id: "custom_pool".to_string(),
            display_name: "Custom".to_string(),
            remaining_pct: 49.5,
            time_until_reset: "1d 2h".to_string(),
            models: vec![],
        });
        let text = compact_text(&snapshot);
        assert_eq!(text.split(COMPACT_SEPARATOR).count(), 3);
        assert!(text.ends_with("🟡 custom_pool 50%"));
    }

    #[test]
    fn test_empty_snapshot_uses_placeholder() {
        let repr = derive(&DisplayState::Ready(QuotaSnapshot::default()));
        assert_eq!(repr.compact_text, EMPTY_TEXT);
        assert!(!repr.compact_text.is_empty());
        assert_ne!(repr.compact_text, LOADING_TEXT);
        assert_ne!(repr.compact_text, ERROR_TEXT);
    }

    #[test]
    fn test_sentinel_states() {
        let loading = derive(&DisplayState::Loading);
        assert_eq!(loading.compact_text, LOADING_TEXT);
        assert!(!loading.alert);

        let error = derive(&DisplayState::Error("Fetch failed".to_string()));
        assert_eq!(error.compact_text, ERROR_TEXT);
        assert!(error.alert);
        assert_eq!(
            error.detail.to_markdown(),
            "Antigravity Pulse: Fetch failed\n\n"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        for state in [
            DisplayState::Loading,
            DisplayState::Error("x".to_string()),
            DisplayState::Ready(scenario()),
        ] {
            assert_eq!(derive(&state), derive(&state.clone()));
        }
    }

    #[test]
    fn test_visual_bar() {
        let filled = |bar: &str| bar.chars().filter(|c| *c == '█').count();

        assert_eq!(visual_bar(0.0), "░".repeat(BAR_CELLS));
        assert_eq!(visual_bar(100.0), "█".repeat(BAR_CELLS));
        assert_eq!(filled(&visual_bar(85.0)), 17);
        assert_eq!(filled(&visual_bar(52.5)), 11);
        for pct in [-10.0, 0.0, 3.3, 47.0, 99.9, 100.0, 180.0] {
            assert_eq!(visual_bar(pct).chars().count(), BAR_CELLS);
        }
    }

    #[test]
    fn test_short_label_fallback() {
        assert_eq!(short_label("gemini3"), "Gemini");
        assert_eq!(short_label("claude_gpt"), "Claude");
        assert_eq!(short_label("gemini2.5"), "Gemini 2.5");
        assert_eq!(short_label("brand_new"), "brand_new");
    }
}
