use serde::{Deserialize, Serialize};

/// Layout budget for the printer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintOptions {
    /// Preferred maximum line width, indentation included
    pub width: usize,
    /// One level of block indentation
    pub indent: String,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            width: 80,
            indent: "  ".to_string(),
        }
    }
}

impl PrintOptions {
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    /// Width left for a node whose first line starts `depth` levels in
    pub fn budget(&self, depth: usize) -> usize {
        self.width
            .saturating_sub(depth.saturating_mul(self.indent.chars().count()))
    }
}
