//! Regex-based text highlighting rules

use crate::geometry::Color;
use regex::Regex;

/// A colored character range in a text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub color: Color,
    /// Start byte offset, inclusive
    pub start: usize,
    /// End byte offset, exclusive
    pub end: usize,
}

/// Produces highlights for a text
pub trait HighlightRule {
    fn process(&self, text: &str, highlights: &mut Vec<Highlight>);
}

/// Highlights every match of a regular expression in one color
///
/// # Example
///
/// ```
/// use filechooser_ui::{Color, HighlightRule, RegexHighlightRule};
///
/// let rule = RegexHighlightRule::new(Color::rgb(1.0, 0.0, 0.0), r"\bfn\b").unwrap();
/// let mut highlights = Vec::new();
/// rule.process("fn main() {}", &mut highlights);
///
/// assert_eq!((highlights[0].start, highlights[0].end), (0, 2));
/// ```
#[derive(Debug, Clone)]
pub struct RegexHighlightRule {
    color: Color,
    pattern: Regex,
}

impl RegexHighlightRule {
    pub fn new(color: Color, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            color,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl HighlightRule for RegexHighlightRule {
    fn process(&self, text: &str, highlights: &mut Vec<Highlight>) {
        highlights.extend(self.pattern.find_iter(text).map(|m| Highlight {
            color: self.color,
            start: m.start(),
            end: m.end(),
        }));
    }
}
