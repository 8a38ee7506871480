//! One-shot `agpulse status` mode.

use agpulse_core::config::Settings;
use agpulse_core::controller_from_settings;
use agpulse_core::monitor::DisplayState;
use agpulse_core::presentation::{derive, Representation};
use tracing::debug;

/// Discover, fetch once, print, and report whether the result was usable
pub async fn run_status(settings: &Settings, detail: bool) -> bool {
    let (mut controller, handle) = controller_from_settings(settings);
    controller.start().await;
    controller.stop();

    let state = handle.display();
    debug!("Status result: {:?}", state);

    println!("{}", render(&derive(&state), detail));
    is_success(&state)
}

/// Text printed for a representation
pub fn render(representation: &Representation, detail: bool) -> String {
    if detail {
        representation.detail.to_markdown()
    } else {
        representation.compact_text.clone()
    }
}

/// Whether a final state should exit successfully
pub fn is_success(state: &DisplayState) -> bool {
    !state.is_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agpulse_core::quota::{Pool, QuotaSnapshot};
    use pretty_assertions::assert_eq;

    fn ready() -> DisplayState {
        DisplayState::Ready(QuotaSnapshot::new(vec![Pool {
            id: "gemini3".to_string(),
            display_name: "Gemini 3".to_string(),
            remaining_pct: 80.0,
            time_until_reset: "2h 5m".to_string(),
            models: vec![],
        }]))
    }

    #[test]
    fn test_render_compact() {
        let rep = derive(&ready());
        assert_eq!(render(&rep, false), rep.compact_text);
        assert!(is_success(&ready()));
    }

    #[test]
    fn test_render_detail_is_markdown() {
        let rep = derive(&ready());
        let text = render(&rep, true);
        assert!(text.starts_with("### Antigravity Quota"));
    }

    #[test]
    fn test_error_is_failure() {
        let state = DisplayState::Error("Antigravity not found".to_string());
        assert!(!is_success(&state));
        assert_eq!(render(&derive(&state), false), "✖ AG");
    }
}
