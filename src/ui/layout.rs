use ratatui::layout::{Constraint, Direction, Rect};

/// Height of the indicator line
const INDICATOR_HEIGHT: u16 = 1;

/// Height of the key hint line
const HINT_HEIGHT: u16 = 1;

/// Layout manager for the UI
#[derive(Debug, Clone, Copy, Default)]
pub struct Layout;

impl Layout {
    /// Create a new layout
    pub fn new() -> Self {
        Self
    }

    /// Split the screen into indicator, detail panel, and hint areas
    pub fn calculate(&self, area: Rect, show_detail: bool) -> LayoutAreas {
        let chunks = ratatui::layout::Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(INDICATOR_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(HINT_HEIGHT),
            ])
            .split(area);

        LayoutAreas {
            indicator: chunks[0],
            detail: (show_detail && chunks[1].height > 0).then_some(chunks[1]),
            hints: chunks[2],
        }
    }
}

/// Calculated layout areas
#[derive(Debug, Clone, Copy)]
pub struct LayoutAreas {
    /// Compact indicator line
    pub indicator: Rect,
    /// Detail panel (if shown)
    pub detail: Option<Rect>,
    /// Key hints
    pub hints: Rect,
}
