//! Word-wrap for free-running inline content.
//!
//! Inline content is a run of text characters and atomic inline tags. A
//! line may only break at a single space whose neighbours are both
//! non-whitespace; the reader turns the line break back into that one
//! space. Whitespace touching the container boundary would be swallowed on
//! re-read, so content that starts or ends with whitespace never wraps.

use crate::syntax::escape_text;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineUnit {
    /// One character of a text run
    Char(char),
    /// An inline tag, already rendered
    Atom(String),
}

impl InlineUnit {
    fn is_whitespace(&self) -> bool {
        matches!(self, InlineUnit::Char(ch) if ch.is_whitespace())
    }
}

/// Content split into unbreakable chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapChunks {
    chunks: Vec<String>,
}

impl WrapChunks {
    /// Split `units` at break opportunities; `None` when the content must
    /// stay on one line
    pub fn split(units: &[InlineUnit]) -> Option<Self> {
        let (first, last) = (units.first()?, units.last()?);
        if first.is_whitespace() || last.is_whitespace() {
            return None;
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut text = String::new();
        for (index, unit) in units.iter().enumerate() {
            match unit {
                InlineUnit::Char(' ') if is_gap(units, index) => {
                    current.push_str(&escape_text(&text));
                    text.clear();
                    chunks.push(std::mem::take(&mut current));
                }
                InlineUnit::Char(ch) => text.push(*ch),
                InlineUnit::Atom(atom) => {
                    current.push_str(&escape_text(&text));
                    text.clear();
                    current.push_str(atom);
                }
            }
        }
        current.push_str(&escape_text(&text));
        chunks.push(current);
        Some(Self { chunks })
    }

    /// Greedy fill: each line takes as many chunks as fit in `budget`. A
    /// chunk longer than the budget gets a line of its own.
    pub fn fill(&self, budget: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        let mut width = 0usize;
        for chunk in &self.chunks {
            let chunk_width = chunk.chars().count();
            if line.is_empty() {
                line.push_str(chunk);
                width = chunk_width;
            } else if width + 1 + chunk_width <= budget {
                line.push(' ');
                line.push_str(chunk);
                width += 1 + chunk_width;
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(chunk);
                width = chunk_width;
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
        lines
    }
}

fn is_gap(units: &[InlineUnit], index: usize) -> bool {
    if index == 0 || index + 1 >= units.len() {
        return false;
    }
    !units[index - 1].is_whitespace() && !units[index + 1].is_whitespace()
}
