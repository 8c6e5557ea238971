//! Ready-made match expressions over typed paths.

use crate::kinds::{classify, EntityKind, FieldKind, TagCategory};
use crate::tag::Tag;
use wml_tagtree::TagTreeMatch;

pub type WmlMatch = TagTreeMatch<Tag>;

/// The entity node `kind`/`key`
pub fn entity(kind: EntityKind, key: &str) -> WmlMatch {
    let key = key.to_string();
    TagTreeMatch::predicate(move |tag: &Tag| tag.is_entity_of(kind, &key))
}

pub fn any_entity() -> WmlMatch {
    category(TagCategory::Entity)
}

pub fn any_field() -> WmlMatch {
    category(TagCategory::Field)
}

pub fn field(kind: FieldKind) -> WmlMatch {
    TagTreeMatch::predicate(move |tag: &Tag| FieldKind::of(tag) == Some(kind))
}

/// `If` wrappers and their branches
pub fn conditional() -> WmlMatch {
    TagTreeMatch::or(vec![category(TagCategory::Conditional), category(TagCategory::Branch)])
}

/// Edit wrappers and their halves
pub fn edit() -> WmlMatch {
    TagTreeMatch::or(vec![category(TagCategory::Edit), category(TagCategory::EditBranch)])
}

/// `Import` and `Export` declarations
pub fn metadata() -> WmlMatch {
    TagTreeMatch::or(vec![category(TagCategory::Import), category(TagCategory::Export)])
}

pub fn category(category: TagCategory) -> WmlMatch {
    TagTreeMatch::predicate(move |tag: &Tag| classify(tag) == category)
}

/// Positions with no entity anywhere below them on the path
pub fn below_last_entity() -> WmlMatch {
    TagTreeMatch::not(TagTreeMatch::any().before(any_entity()))
}

/// Paths whose nearest entity is `kind`/`key` and that are not part of an
/// import or export declaration
pub fn owned_by(kind: EntityKind, key: &str) -> WmlMatch {
    TagTreeMatch::and(vec![
        entity(kind, key),
        below_last_entity(),
        TagTreeMatch::not(TagTreeMatch::any().after(metadata())),
    ])
}
