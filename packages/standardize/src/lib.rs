//! # WML Standardize
//!
//! Turns the documents that describe one asset (a base, its overlays and
//! their edits) into one canonical [`StandardForm`]: one component per key,
//! fields in declared order, edits collapsed, provenance stripped.
//!
//! ```text
//! [Tree, Tree, …] ──Standardizer──▶ StandardForm ──schema()──▶ Tree
//!                                         └──records()──▶ [StandardRecord]
//! ```

pub mod edits;
pub mod error;
pub mod form;
pub mod records;
pub mod standardizer;

#[cfg(test)]
mod tests_standardize;

pub use edits::{apply_edits, compare_edit_trees, EditBoundary, EditComparison};
pub use error::{StandardizeError, StandardizeResult};
pub use form::{ContainerKind, ImportOrigin, StandardComponent, StandardField, StandardForm};
pub use records::StandardRecord;
pub use standardizer::Standardizer;

use wml_schema::WmlTree;

/// Standardize `inputs`, ordered from most inherited to most local
pub fn standardize(inputs: Vec<WmlTree>) -> StandardizeResult<StandardForm> {
    Standardizer::new(inputs).standardize()
}
