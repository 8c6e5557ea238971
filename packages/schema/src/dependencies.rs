//! Dependency annotation for conditions and computed expressions.

use crate::tag::{ComputedTag, StatementTag, TagNode};
use crate::visitor::VisitorMut;

/// Free identifiers of an expression, in first-appearance order.
///
/// Identifiers are maximal runs of `[A-Za-z0-9_$]` that do not start with a
/// digit. Property accesses (`a.b`), string literal contents and the
/// keywords `true`, `false`, `null`, `undefined` are skipped.
pub fn identifiers(expression: &str) -> Vec<String> {
    const KEYWORDS: [&str; 4] = ["true", "false", "null", "undefined"];

    let mut found: Vec<String> = Vec::new();
    let mut chars = expression.char_indices().peekable();
    let mut previous: Option<char> = None;
    while let Some((start, c)) = chars.next() {
        if c == '"' || c == '\'' || c == '`' {
            let quote = c;
            let mut escaped = false;
            for (_, inner) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if inner == '\\' {
                    escaped = true;
                } else if inner == quote {
                    break;
                }
            }
            previous = Some(quote);
            continue;
        }
        if is_word(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(index, next)) = chars.peek() {
                if !is_word(next) {
                    break;
                }
                end = index + next.len_utf8();
                chars.next();
            }
            let word = &expression[start..end];
            let member = previous == Some('.');
            let numeric = word.starts_with(|first: char| first.is_ascii_digit());
            if !member && !numeric && !KEYWORDS.contains(&word) && !found.iter().any(|seen| seen == word) {
                found.push(word.to_string());
            }
            previous = word.chars().last();
            continue;
        }
        if !c.is_whitespace() {
            previous = Some(c);
        }
    }
    found
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Fills `dependencies` on every statement and computed tag
pub struct DependencyAssigner<F> {
    extract: F,
}

impl<F: FnMut(&str) -> Vec<String>> DependencyAssigner<F> {
    pub fn new(extract: F) -> Self {
        Self { extract }
    }
}

impl<F: FnMut(&str) -> Vec<String>> VisitorMut for DependencyAssigner<F> {
    fn visit_statement_mut(&mut self, statement: &mut StatementTag) {
        statement.dependencies = (self.extract)(&statement.condition);
    }

    fn visit_computed_mut(&mut self, computed: &mut ComputedTag) {
        computed.dependencies = (self.extract)(&computed.src);
    }
}

/// Annotate a tree in place with `extract`
pub fn assign_dependencies(tree: &mut [TagNode], extract: impl FnMut(&str) -> Vec<String>) {
    DependencyAssigner::new(extract).visit_tree_mut(tree);
}
