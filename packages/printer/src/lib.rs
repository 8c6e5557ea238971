//! # WML Printer
//!
//! Prints canonical WML trees as text that stays as close to one line per
//! node as the width budget allows, and reads that text back.
//!
//! ```text
//! Tree ──render──▶ [naive, nested, property-nested] per node ──collapse──▶ String
//! String ──reader::parse──▶ Tree
//! ```

pub mod error;
pub mod options;
pub mod printer;
pub mod reader;
pub mod render;
pub mod syntax;
pub mod tokenizer;
pub mod wrap;

#[cfg(test)]
mod tests_printer;

pub use error::{PrintError, PrintResult, ReadError, ReadResult};
pub use options::PrintOptions;
pub use printer::{is_inline_container, Printer};
pub use reader::parse;
pub use render::{collapse, render, Part, PrintMapResult, PrintMode};
pub use syntax::{Element, Property, PropertyValue};

use wml_schema::TagNode;

/// Print `tree` with default options
pub fn print(tree: &[TagNode]) -> PrintResult<String> {
    Printer::default().print(tree)
}
