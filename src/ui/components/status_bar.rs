use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::state::AppState;

/// Indicator line and key hints
pub struct StatusBar;

impl StatusBar {
    /// Render the compact indicator
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        let line = Self::indicator_line(state, area.width);
        let style = Self::indicator_style(state);
        frame.render_widget(Paragraph::new(line).style(style), area);
    }

    /// Render the key hints
    pub fn render_hints(frame: &mut Frame, area: Rect) {
        frame.render_widget(Paragraph::new(Self::hint_line()), area);
    }

    /// Background of the indicator; alert states use red
    fn indicator_style(state: &AppState) -> Style {
        if state.representation.alert {
            Style::default().bg(Color::Red).fg(Color::White)
        } else {
            Style::default().bg(Color::Black).fg(Color::White)
        }
    }

    /// " <compact text>          every 120s · 14:05 "
    fn indicator_line(state: &AppState, width: u16) -> Line<'static> {
        let left = format!(" {}", state.representation.compact_text);
        let right = match state.last_update {
            Some(at) => format!("every {}s · {} ", state.interval_secs, at.format("%H:%M")),
            None => format!("every {}s ", state.interval_secs),
        };

        let used = left.width() + right.width();
        let width = width as usize;
        if used >= width {
            // Narrow terminal: the quota text wins
            return Line::from(Span::styled(
                left,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }

        Line::from(vec![
            Span::styled(left, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" ".repeat(width - used)),
            Span::styled(right, Style::default().fg(Color::Gray)),
        ])
    }

    fn hint_line() -> Line<'static> {
        let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let desc = Style::default().fg(Color::DarkGray);
        Line::from(vec![
            Span::styled(" r", key),
            Span::styled(":Refresh ", desc),
            Span::styled("+/-", key),
            Span::styled(":Interval ", desc),
            Span::styled("d", key),
            Span::styled(":Detail ", desc),
            Span::styled("q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::styled(":Quit", desc),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agpulse_core::monitor::DisplayState;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_indicator_fills_width() {
        let state = AppState::new(120);
        let line = StatusBar::indicator_line(&state, 40);
        let text = text_of(&line);
        assert!(text.starts_with(" ⟳ AG"));
        assert!(text.ends_with("every 120s "));
        assert_eq!(text.width(), 40);
    }

    #[test]
    fn test_indicator_narrow_keeps_quota_text() {
        let state = AppState::new(120);
        let line = StatusBar::indicator_line(&state, 8);
        assert_eq!(text_of(&line), " ⟳ AG");
    }

    #[test]
    fn test_alert_uses_red_background() {
        let mut state = AppState::new(120);
        state.apply(&DisplayState::Error("Fetch failed".to_string()));
        assert_eq!(StatusBar::indicator_style(&state).bg, Some(Color::Red));

        state.apply(&DisplayState::Loading);
        assert_ne!(StatusBar::indicator_style(&state).bg, Some(Color::Red));
    }

    #[test]
    fn test_hints_mention_refresh() {
        assert!(text_of(&StatusBar::hint_line()).contains("r:Refresh"));
    }
}
