//! # Candidate layouts
//!
//! Every node renders to an ordered list of candidate layouts, least to most
//! detailed. Parents build their own candidates from their children's lists
//! and [`collapse`] picks the first one that fits the remaining width.

use crate::error::{PrintError, PrintResult};
use crate::options::PrintOptions;
use crate::syntax::Element;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrintMode {
    /// Everything on one line
    Naive,
    /// Children on their own lines, one level in
    Nested,
    /// Nested, with each property of the opening tag on its own line too
    PropertyNested,
}

/// One candidate layout. Lines after the first are indented relative to
/// the column the first line starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintMapResult {
    pub mode: PrintMode,
    pub output: String,
}

impl PrintMapResult {
    pub fn new(mode: PrintMode, output: impl Into<String>) -> Self {
        Self {
            mode,
            output: output.into(),
        }
    }

    pub fn naive(output: impl Into<String>) -> Self {
        Self::new(PrintMode::Naive, output)
    }

    /// Length of the longest line, in characters
    pub fn width(&self) -> usize {
        self.output
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
    }
}

/// One slot between the opening and closing tag
#[derive(Debug, Clone)]
pub enum Part {
    /// A child's candidates
    Child(Vec<PrintMapResult>),
    /// Fixed text that stays at the parent's own indentation when nested,
    /// such as `<Else />` between conditional branches
    Divider(String),
}

/// Prefix every non-empty line of `block` with `indent`
pub fn indent_block(block: &str, indent: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// First candidate whose longest line fits the budget at `depth`, else the
/// most detailed one. Width never fails a print; an empty list does.
pub fn collapse<'a>(
    candidates: &'a [PrintMapResult],
    depth: usize,
    options: &PrintOptions,
) -> PrintResult<&'a PrintMapResult> {
    let budget = options.budget(depth);
    candidates
        .iter()
        .find(|candidate| candidate.width() <= budget)
        .or_else(|| candidates.last())
        .ok_or_else(|| PrintError::empty_candidates(format!("depth {depth}")))
}

fn collapse_modes<'a>(
    candidates: &'a [PrintMapResult],
    modes: &[PrintMode],
    depth: usize,
    options: &PrintOptions,
) -> Option<&'a PrintMapResult> {
    let budget = options.budget(depth);
    let allowed: Vec<&PrintMapResult> = candidates
        .iter()
        .filter(|candidate| modes.contains(&candidate.mode))
        .collect();
    allowed
        .iter()
        .find(|candidate| candidate.width() <= budget)
        .or_else(|| allowed.last())
        .copied()
}

/// Candidates for `element` holding `parts`, whose own first line starts
/// `depth` levels in.
///
/// - naive exists when every child offers a naive layout
/// - nested exists when every child offers naive or nested
/// - property-nested exists when the element has properties
///
/// An element without parts renders self-closing.
pub fn render(
    element: &Element,
    parts: &[Part],
    depth: usize,
    options: &PrintOptions,
) -> PrintResult<Vec<PrintMapResult>> {
    let indent = options.indent.as_str();
    let has_properties = !element.properties.is_empty();

    if parts.is_empty() {
        let mut candidates = vec![PrintMapResult::naive(element.self_closing())];
        if has_properties {
            candidates.push(PrintMapResult::new(
                PrintMode::PropertyNested,
                element.self_closing_block(indent),
            ));
        }
        return Ok(candidates);
    }

    for part in parts {
        if let Part::Child(candidates) = part {
            if candidates.is_empty() {
                return Err(PrintError::empty_candidates(format!("child of <{}>", element.name)));
            }
        }
    }

    let mut candidates = Vec::with_capacity(3);

    let naive: Option<String> = parts
        .iter()
        .map(|part| match part {
            Part::Child(children) => children
                .iter()
                .find(|candidate| candidate.mode == PrintMode::Naive)
                .map(|candidate| candidate.output.as_str()),
            Part::Divider(divider) => Some(divider.as_str()),
        })
        .collect();
    if let Some(content) = naive {
        candidates.push(PrintMapResult::naive(format!(
            "{}{content}{}",
            element.open(),
            element.close()
        )));
    }

    let nested: Option<Vec<String>> = parts
        .iter()
        .map(|part| match part {
            Part::Child(children) => {
                collapse_modes(children, &[PrintMode::Naive, PrintMode::Nested], depth + 1, options)
                    .map(|candidate| indent_block(&candidate.output, indent))
            }
            Part::Divider(divider) => Some(divider.clone()),
        })
        .collect();
    if let Some(lines) = nested {
        candidates.push(PrintMapResult::new(
            PrintMode::Nested,
            format!("{}\n{}\n{}", element.open(), lines.join("\n"), element.close()),
        ));
    }

    if has_properties {
        let mut lines = Vec::with_capacity(parts.len());
        for part in parts {
            lines.push(match part {
                Part::Child(children) => indent_block(&collapse(children, depth + 1, options)?.output, indent),
                Part::Divider(divider) => divider.clone(),
            });
        }
        candidates.push(PrintMapResult::new(
            PrintMode::PropertyNested,
            format!("{}\n{}\n{}", element.open_block(indent), lines.join("\n"), element.close()),
        ));
    }

    if candidates.is_empty() {
        return Err(PrintError::empty_candidates(format!("<{}>", element.name)));
    }
    Ok(candidates)
}
