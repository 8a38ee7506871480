//! Structured detail payload with a markdown rendering.

use serde::Serialize;

/// Prefix marking a nested (model) line in markdown
const NESTED_PREFIX: &str = "&nbsp;&nbsp;&nbsp;";

/// An inline run of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Plain text
    Text { text: String },
    /// Bold text
    Strong { text: String },
    /// Italic text
    Emphasis { text: String },
    /// Monospace span
    Code { text: String },
}

impl Segment {
    /// Plain text segment
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    /// Bold segment
    pub fn strong(text: impl Into<String>) -> Self {
        Segment::Strong { text: text.into() }
    }

    /// Italic segment
    pub fn emphasis(text: impl Into<String>) -> Self {
        Segment::Emphasis { text: text.into() }
    }

    /// Monospace segment
    pub fn code(text: impl Into<String>) -> Self {
        Segment::Code { text: text.into() }
    }

    /// Visible text of the segment, without markup
    pub fn plain(&self) -> &str {
        match self {
            Segment::Text { text }
            | Segment::Strong { text }
            | Segment::Emphasis { text }
            | Segment::Code { text } => text,
        }
    }

    fn to_markdown(&self) -> String {
        match self {
            Segment::Text { text } => text.clone(),
            Segment::Strong { text } => format!("**{}**", text),
            Segment::Emphasis { text } => format!("_{}_", text),
            Segment::Code { text } => format!("`{}`", text),
        }
    }
}

/// One block of the detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailBlock {
    /// Section heading
    Heading { text: String },
    /// A line of segments; `nested` lines belong to the block above
    Line { nested: bool, segments: Vec<Segment> },
    /// Horizontal rule
    Divider,
}

impl DetailBlock {
    /// Top-level line
    pub fn line(segments: Vec<Segment>) -> Self {
        DetailBlock::Line {
            nested: false,
            segments,
        }
    }

    /// Nested line
    pub fn nested(segments: Vec<Segment>) -> Self {
        DetailBlock::Line {
            nested: true,
            segments,
        }
    }
}

/// Rich detail payload shown on demand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailView {
    /// Blocks in display order
    pub blocks: Vec<DetailBlock>,
}

impl DetailView {
    /// Single-paragraph view
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![DetailBlock::line(vec![Segment::text(text)])],
        }
    }

    /// Number of horizontal rules
    pub fn divider_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, DetailBlock::Divider))
            .count()
    }

    /// Render as markdown (one paragraph per block)
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                DetailBlock::Heading { text } => {
                    out.push_str("### ");
                    out.push_str(text);
                }
                DetailBlock::Line { nested, segments } => {
                    if *nested {
                        out.push_str(NESTED_PREFIX);
                    }
                    for segment in segments {
                        out.push_str(&segment.to_markdown());
                    }
                }
                DetailBlock::Divider => out.push_str("---"),
            }
            out.push_str("\n\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_markdown() {
        let view = DetailView {
            blocks: vec![
                DetailBlock::Heading {
                    text: "Title".to_string(),
                },
                DetailBlock::line(vec![
                    Segment::strong("bold"),
                    Segment::text(" and "),
                    Segment::code("mono"),
                ]),
                DetailBlock::nested(vec![Segment::text("child")]),
                DetailBlock::Divider,
                DetailBlock::line(vec![Segment::emphasis("Go")]),
            ],
        };

        assert_eq!(
            view.to_markdown(),
            "### Title\n\n**bold** and `mono`\n\n&nbsp;&nbsp;&nbsp;child\n\n---\n\n_Go_\n\n"
        );
        assert_eq!(view.divider_count(), 1);
    }

    #[test]
    fn test_segment_plain() {
        assert_eq!(Segment::strong("x").plain(), "x");
        assert_eq!(Segment::emphasis("Go").plain(), "Go");
    }
}
