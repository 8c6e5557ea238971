//! Identity and merge rules wiring typed trees into the tag-tree engine.

use crate::kinds::{classify, TagCategory};
use crate::tag::Tag;
use wml_tagtree::{NodeExtra, TagListEntry, TagTree, TagTreeOptions, TagTreeResult, Tree};

pub type WmlTagTree = TagTree<Tag, TagCategory>;

/// Categories that may interleave at one sibling level without blocking a
/// merge. Inline content is deliberately absent: text order is meaning.
pub const ORDER_INDEPENDENT: [TagCategory; 8] = [
    TagCategory::Container,
    TagCategory::Entity,
    TagCategory::Field,
    TagCategory::ListItem,
    TagCategory::Conditional,
    TagCategory::Import,
    TagCategory::Export,
    TagCategory::Edit,
];

/// Structural identity used by the fold-back
pub fn compare_tags(a: &Tag, b: &Tag) -> bool {
    if let (Some(left), Some(right)) = (a.as_entity(), b.as_entity()) {
        return left.kind == right.kind && left.key == right.key;
    }
    match (a, b) {
        (Tag::Asset { key: left }, Tag::Asset { key: right }) => left == right,
        (Tag::Exit { key: left, .. }, Tag::Exit { key: right, .. }) => left == right,
        (Tag::Position { room: left, .. }, Tag::Position { room: right, .. }) => left == right,
        (Tag::Pronouns(_), Tag::Pronouns(_)) => true,
        (Tag::Name, Tag::Name)
        | (Tag::ShortName, Tag::ShortName)
        | (Tag::Summary, Tag::Summary)
        | (Tag::Description, Tag::Description) => true,
        (Tag::Statement(left), Tag::Statement(right)) => left.condition == right.condition,
        (Tag::Fallthrough, Tag::Fallthrough) => true,
        (Tag::ReplaceMatch, Tag::ReplaceMatch) | (Tag::ReplacePayload, Tag::ReplacePayload) => true,
        (Tag::Import { from: left }, Tag::Import { from: right }) => left == right,
        (Tag::Export, Tag::Export) | (Tag::Inherited, Tag::Inherited) => true,
        _ => false,
    }
}

/// Local data beats inherited data; the first established id is kept
pub fn merge_tag_entries(existing: &TagListEntry<Tag>, incoming: &TagListEntry<Tag>) -> (Tag, NodeExtra) {
    let data = if incoming.extra.inherited && !existing.extra.inherited {
        existing.data.clone()
    } else {
        incoming.data.clone()
    };
    let extra = NodeExtra {
        id: existing.extra.id.clone().or_else(|| incoming.extra.id.clone()),
        inherited: existing.extra.inherited && incoming.extra.inherited,
    };
    (data, extra)
}

/// Nodes whose child groups must stay together across filtering
pub fn is_wrapper(tag: &Tag) -> bool {
    matches!(tag, Tag::If | Tag::Remove | Tag::Replace)
}

pub fn tag_tree_options() -> TagTreeOptions<Tag, TagCategory> {
    TagTreeOptions::new(classify)
        .with_compare(compare_tags)
        .with_merge(merge_tag_entries)
        .with_wrappers(is_wrapper)
        .with_order_independence(vec![ORDER_INDEPENDENT.to_vec()])
}

pub fn tag_tree(tree: &Tree<Tag>) -> TagTreeResult<WmlTagTree> {
    TagTree::new(tree, tag_tree_options())
}
