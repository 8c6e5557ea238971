//! # WML Tag Tree
//!
//! Tag-agnostic query and rewrite algebra over ordered trees.
//!
//! ```text
//! Tree ──flatten──▶ [path, path, …] ──filter/prune/reorder──▶ [path, …] ──fold──▶ Tree
//! ```
//!
//! Every operation is a pure value-to-value transform. The node type and its
//! categories are supplied by the caller through [`TagTreeOptions`].

pub mod engine;
pub mod error;
pub mod matcher;
mod merge;
pub mod options;
pub mod tree;

#[cfg(test)]
mod tests_engine;

pub use engine::{group_by_root, TagList, TagListEntry, TagTree};
pub use error::{TagTreeError, TagTreeResult};
pub use matcher::{Predicate, TagTreeMatch};
pub use options::{right_biased_merge, TagTreeOptions};
pub use tree::{map_tree, strip_extras, structurally_equal, NodeExtra, Tree, TreeNode, MAX_DEPTH};
