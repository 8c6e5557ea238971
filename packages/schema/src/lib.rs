//! # WML Schema
//!
//! The closed WML node vocabulary and everything that gives it meaning to
//! the generic tag-tree engine:
//!
//! - [`Tag`] and the kind tables ([`EntityKind`], [`FieldKind`], [`ListKind`])
//! - classification, identity and merge rules ([`tag_tree_options`])
//! - per-kind allow-lists ([`validate_tree`])
//! - conditional branch selection ([`select_branch`])
//! - id assignment, dependency annotation and visitors

pub mod conditions;
pub mod dependencies;
pub mod error;
pub mod id_generator;
pub mod inline;
pub mod kinds;
pub mod matchers;
pub mod rules;
pub mod tag;
pub mod validator;
pub mod visitor;

pub use conditions::{select_branch, BranchSelection};
pub use dependencies::{assign_dependencies, identifiers, DependencyAssigner};
pub use error::{SchemaError, SchemaResult};
pub use id_generator::{assign_missing_ids, get_document_id, IdGenerator};
pub use inline::merge_text_runs;
pub use kinds::{classify, EntityKind, FieldKind, ListKind, TagCategory};
pub use matchers::WmlMatch;
pub use rules::{compare_tags, is_wrapper, merge_tag_entries, tag_tree, tag_tree_options, WmlTagTree};
pub use tag::{
    node, text, ComputedTag, EntityRef, ImageTag, Keyed, PronounsTag, StatementTag, Tag, TagNode, WmlTree,
    VariableTag,
};
pub use validator::{allows, allows_child, validate_tree};
pub use visitor::{walk_tree, walk_tree_mut, Visitor, VisitorMut};
