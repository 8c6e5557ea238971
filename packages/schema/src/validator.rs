//! Per-kind child allow-lists and whole-tree validation.

use crate::error::{SchemaError, SchemaResult};
use crate::kinds::{classify, EntityKind, FieldKind, TagCategory};
use crate::tag::{Tag, TagNode};
use tracing::debug;
use wml_tagtree::MAX_DEPTH;

/// Tags that take their allow-list from the nearest non-transparent
/// ancestor
pub fn is_transparent(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::If
            | Tag::Statement(_)
            | Tag::Fallthrough
            | Tag::Remove
            | Tag::Replace
            | Tag::ReplaceMatch
            | Tag::ReplacePayload
            | Tag::Inherited
    )
}

/// Whether `child` may appear directly under `parent`, where `context` is
/// the nearest non-transparent ancestor
pub fn allows_child(parent: &Tag, context: &Tag, child: &Tag) -> bool {
    match parent {
        Tag::If => return matches!(child, Tag::Statement(_) | Tag::Fallthrough),
        Tag::Replace => return matches!(child, Tag::ReplaceMatch | Tag::ReplacePayload),
        _ => {}
    }
    if matches!(
        child,
        Tag::Statement(_) | Tag::Fallthrough | Tag::ReplaceMatch | Tag::ReplacePayload
    ) {
        return false;
    }
    allows(context, child)
}

/// Allow-list of a non-transparent tag
pub fn allows(parent: &Tag, child: &Tag) -> bool {
    match parent {
        Tag::Asset { .. } => match child {
            Tag::Character(_) => false,
            Tag::If | Tag::Import { .. } | Tag::Export | Tag::Inherited => true,
            other => other.as_entity().is_some(),
        },
        Tag::Import { .. } | Tag::Export => child.as_entity().is_some(),
        Tag::Name | Tag::ShortName | Tag::Summary | Tag::Description => inline_child(child),
        Tag::Link { .. } => matches!(child, Tag::Text { .. }),
        _ => match parent.as_entity() {
            Some(entity) => entity_child(entity.kind, child),
            None => false,
        },
    }
}

fn inline_child(child: &Tag) -> bool {
    matches!(classify(child), TagCategory::Inline)
        || matches!(child, Tag::If | Tag::Remove | Tag::Replace)
}

fn entity_child(kind: EntityKind, child: &Tag) -> bool {
    if let Some(field) = FieldKind::of(child) {
        return kind.has_field(field);
    }
    if matches!(child, Tag::If | Tag::Remove | Tag::Replace | Tag::Inherited) {
        return !kind.fields().is_empty() || !kind.lists().is_empty();
    }
    let nested = child.as_entity().map(|entity| entity.kind);
    match kind {
        EntityKind::Room => {
            matches!(child, Tag::Exit { .. })
                || matches!(nested, Some(EntityKind::Feature | EntityKind::Knowledge))
        }
        EntityKind::Map => {
            matches!(child, Tag::Position { .. }) || matches!(nested, Some(EntityKind::Image))
        }
        EntityKind::Character => {
            matches!(child, Tag::Pronouns(_) | Tag::Import { .. }) || matches!(nested, Some(EntityKind::Image))
        }
        EntityKind::Theme => matches!(nested, Some(EntityKind::Room | EntityKind::Map)),
        EntityKind::Message => matches!(nested, Some(EntityKind::Room)),
        EntityKind::Moment => matches!(nested, Some(EntityKind::Message)),
        _ => false,
    }
}

fn check_properties(tag: &Tag) -> SchemaResult<()> {
    if let Some(entity) = tag.as_entity() {
        if entity.key.is_empty() {
            return Err(SchemaError::missing_property(tag.name(), "key"));
        }
    }
    match tag {
        Tag::Asset { key } if key.is_empty() => Err(SchemaError::missing_property("Asset", "key")),
        Tag::Exit { to, .. } if to.is_empty() => Err(SchemaError::missing_property("Exit", "to")),
        Tag::Position { room, .. } if room.is_empty() => Err(SchemaError::missing_property("Position", "room")),
        Tag::Link { to } if to.is_empty() => Err(SchemaError::missing_property("Link", "to")),
        Tag::Statement(statement) if statement.condition.trim().is_empty() => {
            Err(SchemaError::missing_property("If", "condition"))
        }
        Tag::Import { from } if from.is_empty() => Err(SchemaError::missing_property("Import", "from")),
        _ => Ok(()),
    }
}

/// Validate a whole document: root kinds, required properties and every
/// parent/child pair
pub fn validate_tree(tree: &[TagNode]) -> SchemaResult<()> {
    // (node, (parent, context), depth)
    let mut stack: Vec<(&TagNode, Option<(&Tag, &Tag)>, usize)> = Vec::new();
    for root in tree.iter().rev() {
        if !root.data.is_container() {
            return Err(SchemaError::InvalidRoot {
                tag: root.data.name().to_string(),
            });
        }
        stack.push((root, None, 0));
    }

    let mut visited = 0usize;
    while let Some((node, parent, depth)) = stack.pop() {
        if depth >= MAX_DEPTH {
            return Err(SchemaError::MaxNestingDepthExceeded { max_depth: MAX_DEPTH });
        }
        visited += 1;
        check_properties(&node.data)?;
        if let Some((parent, context)) = parent {
            if !allows_child(parent, context, &node.data) {
                let owner = if matches!(parent, Tag::If | Tag::Replace) { parent } else { context };
                return Err(SchemaError::disallowed_child(owner.name(), node.data.name()));
            }
        }

        let context = match parent {
            Some((_, context)) if is_transparent(&node.data) => context,
            _ => &node.data,
        };
        for child in node.children.iter().rev() {
            stack.push((child, Some((&node.data, context)), depth + 1));
        }
    }

    debug!(nodes = visited, "validated tree");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{node, text, WmlTree};

    fn asset(children: Vec<TagNode>) -> WmlTree {
        vec![node(Tag::asset("base"), children)]
    }

    #[test]
    fn test_valid_room() {
        let tree = asset(vec![node(
            Tag::room("lobby"),
            vec![
                node(Tag::Name, vec![text("Lobby")]),
                node(
                    Tag::If,
                    vec![node(Tag::statement("open"), vec![node(
                        Tag::Exit {
                            key: "lobby#hall".to_string(),
                            to: "hall".to_string(),
                        },
                        vec![],
                    )])],
                ),
            ],
        )]);
        assert_eq!(validate_tree(&tree), Ok(()));
    }

    #[test]
    fn test_disallowed_child() {
        let tree = asset(vec![node(Tag::room("lobby"), vec![text("loose")])]);
        assert_eq!(
            validate_tree(&tree),
            Err(SchemaError::disallowed_child("Room", "String"))
        );

        let tree = asset(vec![node(Tag::feature("f"), vec![node(Tag::Summary, vec![])])]);
        assert_eq!(
            validate_tree(&tree),
            Err(SchemaError::disallowed_child("Feature", "Summary"))
        );
    }

    #[test]
    fn test_transparent_tags_use_outer_context() {
        let inside_field = node(
            Tag::Description,
            vec![node(Tag::If, vec![node(Tag::statement("c"), vec![text("hi")])])],
        );
        assert!(validate_tree(&asset(vec![node(Tag::room("r"), vec![inside_field])])).is_ok());

        let text_in_room = node(
            Tag::room("r"),
            vec![node(Tag::If, vec![node(Tag::statement("c"), vec![text("hi")])])],
        );
        assert_eq!(
            validate_tree(&asset(vec![text_in_room])),
            Err(SchemaError::disallowed_child("Room", "String"))
        );
    }

    #[test]
    fn test_branches_only_under_if() {
        let tree = asset(vec![node(
            Tag::room("r"),
            vec![node(Tag::Description, vec![node(Tag::statement("c"), vec![text("x")])])],
        )]);
        assert_eq!(
            validate_tree(&tree),
            Err(SchemaError::disallowed_child("Description", "Statement"))
        );
    }

    #[test]
    fn test_invalid_root_and_missing_key() {
        assert_eq!(
            validate_tree(&vec![node(Tag::room("r"), vec![])]),
            Err(SchemaError::InvalidRoot {
                tag: "Room".to_string()
            })
        );
        assert_eq!(
            validate_tree(&asset(vec![node(Tag::room(""), vec![])])),
            Err(SchemaError::missing_property("Room", "key"))
        );
    }

    #[test]
    fn test_depth_guard() {
        let mut deep = text("x");
        for _ in 0..MAX_DEPTH {
            deep = node(Tag::If, vec![node(Tag::statement("c"), vec![deep])]);
        }
        let tree = asset(vec![node(Tag::room("r"), vec![node(Tag::Description, vec![deep])])]);
        assert_eq!(
            validate_tree(&tree),
            Err(SchemaError::MaxNestingDepthExceeded { max_depth: MAX_DEPTH })
        );
    }
}
