//! Resolution of `<Remove>` and `<Replace>` edits against the content they
//! follow.
//!
//! An edit targets the content immediately before it: the whole run of
//! inline siblings (text, spaces, line breaks, links) when the preceding
//! sibling is inline, otherwise that single sibling. Adjacent text runs are
//! joined first, so content split across documents reads as one string.
//! Consecutive edits after one target form a slot, and a slot collapses to exactly one
//! of: the surviving content, a net `<Remove>`, a net `<Replace>`, or
//! nothing at all.

use crate::error::{StandardizeError, StandardizeResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use wml_schema::{classify, merge_text_runs, tag_tree, tag_tree_options, Tag, TagCategory, TagNode, WmlTree};
use wml_tagtree::{NodeExtra, TagList, TagListEntry, TagTree, TreeNode, MAX_DEPTH};

/// Which end of the two sides was aligned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditBoundary {
    /// Both sides share their beginning; the remainder trails
    Start,
    /// Both sides share their end; the remainder leads
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditComparison {
    Equal,
    /// The base extends beyond the edit by `remainder`
    BaseLonger { remainder: WmlTree, boundary: EditBoundary },
    /// The edit extends beyond the base by `remainder`
    EditLonger { remainder: WmlTree, boundary: EditBoundary },
    MergeConflict,
}

/// Classify how `edit` lines up against `base`.
///
/// Both forests are flattened and aligned path by path, first from the
/// start and then from the end. Every aligned pair must be identical except
/// the innermost one, where two text leaves may overlap at sub-string level.
pub fn compare_edit_trees(base: &[TagNode], edit: &[TagNode]) -> StandardizeResult<EditComparison> {
    let base_lists = tag_tree(&base.to_vec())?.tag_list();
    let edit_lists = tag_tree(&edit.to_vec())?.tag_list();

    for boundary in [EditBoundary::Start, EditBoundary::End] {
        if let Some(alignment) = align(&base_lists, &edit_lists, boundary) {
            return Ok(match alignment {
                Alignment::Equal => EditComparison::Equal,
                Alignment::BaseLonger(lists) => EditComparison::BaseLonger {
                    remainder: fold(lists)?,
                    boundary,
                },
                Alignment::EditLonger(lists) => EditComparison::EditLonger {
                    remainder: fold(lists)?,
                    boundary,
                },
            });
        }
    }
    Ok(EditComparison::MergeConflict)
}

enum Alignment {
    Equal,
    BaseLonger(Vec<TagList<Tag>>),
    EditLonger(Vec<TagList<Tag>>),
}

enum Overlap {
    Same,
    /// The first side's text is longer; holds the excess
    FirstLonger(String),
    SecondLonger(String),
}

fn align(base: &[TagList<Tag>], edit: &[TagList<Tag>], boundary: EditBoundary) -> Option<Alignment> {
    let shared = base.len().min(edit.len());
    let pair = |offset: usize| match boundary {
        EditBoundary::Start => (offset, offset),
        EditBoundary::End => (base.len() - 1 - offset, edit.len() - 1 - offset),
    };

    for offset in 0..shared.saturating_sub(1) {
        let (b, e) = pair(offset);
        if !same_path(&base[b], &edit[e]) {
            return None;
        }
    }

    let mut base_rest: Vec<TagList<Tag>> = Vec::new();
    let mut edit_rest: Vec<TagList<Tag>> = Vec::new();

    if shared > 0 {
        let (b, e) = pair(shared - 1);
        match overlap(&base[b], &edit[e], boundary)? {
            Overlap::Same => {}
            Overlap::FirstLonger(excess) => base_rest.extend(split_text(&base[b], &excess, base)),
            Overlap::SecondLonger(excess) => edit_rest.extend(split_text(&edit[e], &excess, edit)),
        }
    }

    match boundary {
        EditBoundary::Start => {
            base_rest.extend(base[shared..].iter().cloned());
            edit_rest.extend(edit[shared..].iter().cloned());
        }
        EditBoundary::End => {
            let leading = |lists: &[TagList<Tag>]| lists[..lists.len() - shared].to_vec();
            base_rest = [leading(base), base_rest].concat();
            edit_rest = [leading(edit), edit_rest].concat();
        }
    }

    match (base_rest.is_empty(), edit_rest.is_empty()) {
        (true, true) => Some(Alignment::Equal),
        (false, true) => Some(Alignment::BaseLonger(base_rest)),
        (true, false) => Some(Alignment::EditLonger(edit_rest)),
        (false, false) => None,
    }
}

fn same_path(a: &TagList<Tag>, b: &TagList<Tag>) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.data == y.data)
}

/// Compare the innermost aligned pair, allowing text leaves to overlap
fn overlap(a: &TagList<Tag>, b: &TagList<Tag>, boundary: EditBoundary) -> Option<Overlap> {
    if same_path(a, b) {
        return Some(Overlap::Same);
    }
    let (Some((a_leaf, a_ancestors)), Some((b_leaf, b_ancestors))) = (a.split_last(), b.split_last()) else {
        return None;
    };
    if a_ancestors.len() != b_ancestors.len()
        || !a_ancestors.iter().zip(b_ancestors).all(|(x, y)| x.data == y.data)
    {
        return None;
    }
    let (Some(a_text), Some(b_text)) = (a_leaf.data.text_value(), b_leaf.data.text_value()) else {
        return None;
    };

    let excess = |long: &str, short: &str| -> Option<String> {
        match boundary {
            EditBoundary::Start => long.strip_prefix(short).map(str::to_string),
            EditBoundary::End => long.strip_suffix(short).map(str::to_string),
        }
    };
    if a_text.len() > b_text.len() {
        excess(a_text, b_text).map(Overlap::FirstLonger)
    } else {
        excess(b_text, a_text).map(Overlap::SecondLonger)
    }
}

/// Paths for the excess of a partially matched text leaf. Surrounding
/// whitespace becomes explicit `<Space />` entries.
fn split_text(path: &TagList<Tag>, excess: &str, side: &[TagList<Tag>]) -> Vec<TagList<Tag>> {
    let Some((leaf, ancestors)) = path.split_last() else {
        return Vec::new();
    };
    let mut next_instance = side
        .iter()
        .flatten()
        .map(TagListEntry::instance)
        .max()
        .map_or(0, |max| max + 1);
    let mut fresh = |data: Tag, extra: NodeExtra| {
        let mut list = ancestors.to_vec();
        list.push(TagListEntry::new(data, extra, next_instance));
        next_instance += 1;
        list
    };

    let trimmed = excess.trim();
    let mut lists = Vec::new();
    if excess.starts_with(char::is_whitespace) {
        lists.push(fresh(Tag::Space, NodeExtra::default()));
    }
    if !trimmed.is_empty() {
        lists.push(fresh(Tag::text(trimmed), leaf.extra.clone()));
    }
    if !trimmed.is_empty() && excess.ends_with(char::is_whitespace) {
        lists.push(fresh(Tag::Space, NodeExtra::default()));
    }
    lists
}

fn fold(lists: Vec<TagList<Tag>>) -> StandardizeResult<WmlTree> {
    Ok(TagTree::from_tag_lists(lists, tag_tree_options())?.tree())
}

/// Running state of one sibling slot
#[derive(Default)]
struct Slot {
    add: Vec<TagNode>,
    remove: Vec<TagNode>,
    open: bool,
}

impl Slot {
    fn start(target: Vec<TagNode>) -> Self {
        Self {
            add: target,
            remove: Vec::new(),
            open: true,
        }
    }

    fn absorb(&mut self, edit: &TagNode) -> StandardizeResult<()> {
        let (target, payload, is_remove) = edit_halves(edit)?;

        if self.add.is_empty() {
            self.remove.extend(target.iter().cloned());
            self.add = payload;
            return Ok(());
        }

        match compare_edit_trees(&self.add, &target)? {
            EditComparison::Equal => self.add = payload,
            EditComparison::BaseLonger { mut remainder, boundary } => {
                self.add = match boundary {
                    EditBoundary::Start => {
                        if is_remove && remainder.first().is_some_and(|n| n.data == Tag::Space) {
                            remainder.remove(0);
                        }
                        [payload, remainder].concat()
                    }
                    EditBoundary::End => {
                        if is_remove && remainder.last().is_some_and(|n| n.data == Tag::Space) {
                            remainder.pop();
                        }
                        [remainder, payload].concat()
                    }
                };
            }
            EditComparison::EditLonger { remainder, .. } => {
                self.remove.extend(remainder);
                self.add = payload;
            }
            EditComparison::MergeConflict => {
                return Err(StandardizeError::merge_conflict(describe(&self.add), describe(&target)));
            }
        }
        Ok(())
    }

    fn finish(self) -> Vec<TagNode> {
        match (self.remove.is_empty(), self.add.is_empty()) {
            (true, _) => self.add,
            (false, true) => vec![TreeNode::new(Tag::Remove).with_children(self.remove)],
            (false, false) => vec![TreeNode::new(Tag::Replace).with_children(vec![
                TreeNode::new(Tag::ReplaceMatch).with_children(self.remove),
                TreeNode::new(Tag::ReplacePayload).with_children(self.add),
            ])],
        }
    }
}

/// Split an edit node into (target, payload, is_remove)
fn edit_halves(edit: &TagNode) -> StandardizeResult<(Vec<TagNode>, Vec<TagNode>, bool)> {
    match edit.data {
        Tag::Remove => Ok((edit.children.clone(), Vec::new(), true)),
        Tag::Replace => {
            let mut target = None;
            let mut payload = None;
            for half in &edit.children {
                match half.data {
                    Tag::ReplaceMatch => target = Some(half.children.clone()),
                    Tag::ReplacePayload => payload = Some(half.children.clone()),
                    _ => {
                        return Err(StandardizeError::malformed_edit(format!(
                            "<{}> inside <Replace>",
                            half.data.name()
                        )))
                    }
                }
            }
            let target = target.ok_or_else(|| StandardizeError::malformed_edit("<Replace> without a match"))?;
            Ok((target, payload.unwrap_or_default(), false))
        }
        _ => Err(StandardizeError::malformed_edit(format!("<{}> is not an edit", edit.data.name()))),
    }
}

fn is_edit(node: &TagNode) -> bool {
    matches!(node.data, Tag::Remove | Tag::Replace)
}

/// Readable summary of a forest for conflict messages
fn describe(nodes: &[TagNode]) -> String {
    let mut out = String::new();
    let mut stack: Vec<&TagNode> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match &node.data {
            Tag::Text { value } => out.push_str(value),
            Tag::Space => out.push(' '),
            other if node.children.is_empty() => {
                out.push('<');
                out.push_str(other.name());
                out.push_str(" />");
            }
            _ => {}
        }
        stack.extend(node.children.iter().rev());
    }
    out
}

fn is_inline(node: &TagNode) -> bool {
    classify(&node.data) == TagCategory::Inline
}

/// Pop the content an edit opening a slot applies to off the end of `output`
fn take_target(output: &mut Vec<TagNode>) -> Vec<TagNode> {
    match output.last() {
        Some(previous) if is_inline(previous) => {
            let start = output
                .iter()
                .rposition(|node| !is_inline(node))
                .map_or(0, |index| index + 1);
            output.split_off(start)
        }
        Some(previous) if !is_edit(previous) => output.pop().into_iter().collect(),
        _ => Vec::new(),
    }
}

fn resolve_siblings(mut siblings: Vec<TagNode>) -> StandardizeResult<Vec<TagNode>> {
    if !siblings.iter().any(is_edit) {
        return Ok(siblings);
    }
    merge_text_runs(&mut siblings);

    let mut output: Vec<TagNode> = Vec::with_capacity(siblings.len());
    let mut slot = Slot::default();
    for sibling in siblings {
        if is_edit(&sibling) {
            if !slot.open {
                slot = Slot::start(take_target(&mut output));
            }
            slot.absorb(&sibling)?;
        } else {
            if slot.open {
                output.extend(std::mem::take(&mut slot).finish());
            }
            output.push(sibling);
        }
    }
    if slot.open {
        output.extend(slot.finish());
    }
    Ok(output)
}

/// Collapse every edit slot in the tree
#[instrument(skip(tree), fields(roots = tree.len()))]
pub fn apply_edits(tree: &[TagNode]) -> StandardizeResult<WmlTree> {
    let mut resolved = tree.to_vec();
    let mut slots = 0usize;
    let mut stack: Vec<(&mut Vec<TagNode>, usize)> = vec![(&mut resolved, 0)];
    while let Some((siblings, depth)) = stack.pop() {
        if depth > MAX_DEPTH {
            return Err(wml_schema::SchemaError::MaxNestingDepthExceeded { max_depth: MAX_DEPTH }.into());
        }
        if siblings.iter().any(is_edit) {
            slots += 1;
            *siblings = resolve_siblings(std::mem::take(siblings))?;
        }
        for node in siblings.iter_mut() {
            stack.push((&mut node.children, depth + 1));
        }
    }
    debug!(slots, "resolved edits");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wml_schema::{node, text};
    use wml_tagtree::strip_extras;

    fn remove(children: Vec<TagNode>) -> TagNode {
        node(Tag::Remove, children)
    }

    fn replace(target: Vec<TagNode>, payload: Vec<TagNode>) -> TagNode {
        node(
            Tag::Replace,
            vec![node(Tag::ReplaceMatch, target), node(Tag::ReplacePayload, payload)],
        )
    }

    fn space() -> TagNode {
        node(Tag::Space, vec![])
    }

    #[test]
    fn test_compare_equal() {
        let base = vec![text("old door")];
        assert_eq!(compare_edit_trees(&base, &base).unwrap(), EditComparison::Equal);
    }

    #[test]
    fn test_compare_prefix_splits_whitespace() {
        let comparison = compare_edit_trees(&[text("old door")], &[text("old")]).unwrap();
        assert_eq!(
            comparison,
            EditComparison::BaseLonger {
                remainder: vec![space(), text("door")],
                boundary: EditBoundary::Start,
            }
        );
    }

    #[test]
    fn test_compare_suffix() {
        let comparison = compare_edit_trees(&[text("old door")], &[text("door")]).unwrap();
        assert_eq!(
            comparison,
            EditComparison::BaseLonger {
                remainder: vec![text("old"), space()],
                boundary: EditBoundary::End,
            }
        );
    }

    #[test]
    fn test_compare_extra_paths() {
        let base = vec![text("a"), node(Tag::LineBreak, vec![]), text("b")];
        let edit = vec![text("a")];
        let comparison = compare_edit_trees(&base, &edit).unwrap();
        assert_eq!(
            comparison,
            EditComparison::BaseLonger {
                remainder: vec![node(Tag::LineBreak, vec![]), text("b")],
                boundary: EditBoundary::Start,
            }
        );
    }

    #[test]
    fn test_compare_conflict() {
        let comparison = compare_edit_trees(&[text("an old door")], &[text("old")]).unwrap();
        assert_eq!(comparison, EditComparison::MergeConflict);
    }

    #[test]
    fn test_compare_symmetry() {
        let cases: Vec<(Vec<TagNode>, Vec<TagNode>)> = vec![
            (vec![text("old door")], vec![text("old")]),
            (vec![text("old door")], vec![text("door")]),
            (vec![text("a"), space(), text("b")], vec![text("a")]),
            (vec![text("x")], vec![text("y")]),
        ];
        for (a, b) in cases {
            let forward = compare_edit_trees(&a, &b).unwrap();
            let backward = compare_edit_trees(&b, &a).unwrap();
            match (forward, backward) {
                (
                    EditComparison::BaseLonger { remainder: r1, boundary: b1 },
                    EditComparison::EditLonger { remainder: r2, boundary: b2 },
                ) => {
                    assert_eq!(r1, r2);
                    assert_eq!(b1, b2);
                }
                (EditComparison::MergeConflict, EditComparison::MergeConflict) => {}
                (EditComparison::Equal, EditComparison::Equal) => {}
                (forward, backward) => panic!("asymmetric: {forward:?} vs {backward:?}"),
            }
        }
    }

    #[test]
    fn test_remove_prefix_absorbs_space() {
        let tree = vec![node(Tag::Description, vec![text("old door"), remove(vec![text("old")])])];
        let resolved = strip_extras(&apply_edits(&tree).unwrap());
        assert_eq!(resolved, vec![node(Tag::Description, vec![text("door")])]);
    }

    #[test]
    fn test_remove_whole_content_leaves_nothing() {
        let tree = vec![node(Tag::Description, vec![text("old door"), remove(vec![text("old door")])])];
        let resolved = apply_edits(&tree).unwrap();
        assert_eq!(resolved, vec![node(Tag::Description, vec![])]);
    }

    #[test]
    fn test_remove_suffix_absorbs_space() {
        let tree = vec![node(Tag::Description, vec![text("old door"), remove(vec![text("door")])])];
        let resolved = strip_extras(&apply_edits(&tree).unwrap());
        assert_eq!(resolved, vec![node(Tag::Description, vec![text("old")])]);
    }

    #[test]
    fn test_replace_keeps_space() {
        let tree = vec![node(
            Tag::Description,
            vec![text("old door"), replace(vec![text("old")], vec![text("new")])],
        )];
        let resolved = strip_extras(&apply_edits(&tree).unwrap());
        assert_eq!(
            resolved,
            vec![node(Tag::Description, vec![text("new"), space(), text("door")])]
        );
    }

    #[test]
    fn test_chained_edits_in_one_slot() {
        let tree = vec![node(
            Tag::Description,
            vec![
                text("big old door"),
                remove(vec![text("big")]),
                replace(vec![text("old door")], vec![text("gate")]),
            ],
        )];
        let resolved = strip_extras(&apply_edits(&tree).unwrap());
        assert_eq!(resolved, vec![node(Tag::Description, vec![text("gate")])]);
    }

    #[test]
    fn test_edit_longer_becomes_net_remove() {
        let tree = vec![node(Tag::Description, vec![text("door"), remove(vec![text("old door")])])];
        let resolved = strip_extras(&apply_edits(&tree).unwrap());
        assert_eq!(
            resolved,
            vec![node(Tag::Description, vec![remove(vec![text("old"), space()])])]
        );
    }

    #[test]
    fn test_edit_without_target_stays_net() {
        let tree = vec![node(Tag::Description, vec![remove(vec![text("gone")])])];
        let resolved = apply_edits(&tree).unwrap();
        assert_eq!(resolved, tree);
    }

    #[test]
    fn test_conflict_is_an_error() {
        let tree = vec![node(Tag::Description, vec![text("an old door"), remove(vec![text("old")])])];
        assert_eq!(
            apply_edits(&tree),
            Err(StandardizeError::merge_conflict("an old door", "old"))
        );
    }

    #[test]
    fn test_remove_spans_split_text_runs() {
        let tree = vec![node(
            Tag::Description,
            vec![text("old "), text("door"), remove(vec![text("old door")])],
        )];
        let resolved = apply_edits(&tree).unwrap();
        assert_eq!(resolved, vec![node(Tag::Description, vec![])]);
    }

    #[test]
    fn test_edit_targets_whole_inline_run() {
        let tree = vec![node(
            Tag::Description,
            vec![
                text("Past the"),
                space(),
                node(Tag::Link { to: "gate".to_string() }, vec![text("gate")]),
                text(" an old door"),
                remove(vec![text("old door")]),
            ],
        )];
        let resolved = strip_extras(&apply_edits(&tree).unwrap());
        assert_eq!(
            resolved,
            vec![node(
                Tag::Description,
                vec![
                    text("Past the"),
                    space(),
                    node(Tag::Link { to: "gate".to_string() }, vec![text("gate")]),
                    space(),
                    text("an"),
                ],
            )]
        );
    }

    #[test]
    fn test_list_item_edit_targets_single_sibling() {
        let exit = |to: &str| {
            node(
                Tag::Exit {
                    key: format!("x#{to}"),
                    to: to.to_string(),
                },
                vec![],
            )
        };
        let tree = vec![exit("a"), exit("b"), remove(vec![exit("b")])];
        assert_eq!(apply_edits(&tree).unwrap(), vec![exit("a")]);
    }

    #[test]
    fn test_untouched_content_passes_through() {
        let tree = vec![node(Tag::Name, vec![text("Hall"), space(), text("way")])];
        assert_eq!(apply_edits(&tree).unwrap(), tree);
    }
}
