//! Renders a [`DetailView`] into a bordered panel.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

use agpulse_core::presentation::{DetailBlock, DetailView, Segment};

use crate::ui::state::AppState;

/// Indentation for nested (model) lines
const NESTED_INDENT: &str = "   ";

/// Detail panel widget
pub struct DetailPanel;

impl DetailPanel {
    /// Render the detail panel
    pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(Self::build_title(state))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Gray));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines = Self::lines(&state.representation.detail, inner.width);
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    /// Block title with the last update time
    fn build_title(state: &AppState) -> String {
        match state.last_update {
            Some(at) => format!(" Quota ({}) ", at.format("%H:%M")),
            None => " Quota ".to_string(),
        }
    }

    /// One terminal line per block
    fn lines(view: &DetailView, width: u16) -> Vec<Line<'static>> {
        view.blocks
            .iter()
            .map(|block| Self::block_line(block, width))
            .collect()
    }

    fn block_line(block: &DetailBlock, width: u16) -> Line<'static> {
        match block {
            DetailBlock::Heading { text } => Line::from(Span::styled(
                format!(" {}", text),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
            DetailBlock::Divider => Line::from(Span::styled(
                "─".repeat(width as usize),
                Style::default().fg(Color::DarkGray),
            )),
            DetailBlock::Line { nested, segments } => {
                let indent = if *nested {
                    format!(" {}", NESTED_INDENT)
                } else {
                    " ".to_string()
                };
                let mut spans = vec![Span::raw(indent)];
                spans.extend(segments.iter().map(Self::segment_span));
                Line::from(spans)
            }
        }
    }

    fn segment_span(segment: &Segment) -> Span<'static> {
        let style = match segment {
            Segment::Text { .. } => Style::default(),
            Segment::Strong { .. } => Style::default().add_modifier(Modifier::BOLD),
            Segment::Emphasis { .. } => Style::default().add_modifier(Modifier::ITALIC),
            Segment::Code { .. } => Style::default().fg(Color::Gray),
        };
        Span::styled(segment.plain().to_string(), style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agpulse_core::presentation::REFRESH_HINT;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_nested_line_is_indented() {
        let block = DetailBlock::nested(vec![Segment::text("🟢 Gemini 3 Pro: 80%")]);
        let line = DetailPanel::block_line(&block, 40);
        assert_eq!(text_of(&line), "    🟢 Gemini 3 Pro: 80%");
    }

    #[test]
    fn test_divider_spans_width() {
        let line = DetailPanel::block_line(&DetailBlock::Divider, 12);
        assert_eq!(text_of(&line), "─".repeat(12));
    }

    #[test]
    fn test_strong_segment_is_bold() {
        let span = DetailPanel::segment_span(&Segment::strong("Gemini 3.x"));
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(span.content, "Gemini 3.x");
    }

    #[test]
    fn test_refresh_hint_is_italic() {
        let span = DetailPanel::segment_span(&Segment::emphasis(REFRESH_HINT));
        assert_eq!(span.content, "Click to refresh");
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_message_view_has_one_line() {
        let view = DetailView::message("Antigravity Pulse: no data yet");
        let lines = DetailPanel::lines(&view, 40);
        assert_eq!(lines.len(), 1);
        assert_eq!(text_of(&lines[0]), " Antigravity Pulse: no data yet");
    }

    #[test]
    fn test_title_without_update() {
        assert_eq!(DetailPanel::build_title(&AppState::new(120)), " Quota ");
    }
}
