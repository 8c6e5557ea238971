//! Fold-back of flattened paths into a tree.
//!
//! Nodes are built in an arena and linked by index; a node's children are
//! always created after it, so the final tree is assembled in one reverse
//! pass without recursion.

use crate::engine::{TagList, TagListEntry};
use crate::options::TagTreeOptions;
use crate::tree::{Tree, TreeNode};

struct ArenaNode<T> {
    entry: TagListEntry<T>,
    children: Vec<usize>,
}

pub(crate) fn iterative_merge<T, C>(lists: &[TagList<T>], options: &TagTreeOptions<T, C>) -> Tree<T>
where
    T: Clone,
    C: Copy + PartialEq,
{
    let mut arena: Vec<ArenaNode<T>> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();

    for list in lists {
        let mut parent: Option<usize> = None;
        for entry in list {
            let siblings = match parent {
                Some(index) => &arena[index].children,
                None => &roots,
            };

            let index = match find_sibling(&arena, siblings, entry, options) {
                Some(found) => {
                    let (data, extra) = options.merge_entries(&arena[found].entry, entry);
                    arena[found].entry.data = data;
                    arena[found].entry.extra = extra;
                    found
                }
                None => {
                    let position = insertion_point(&arena, siblings, entry, options);
                    let created = arena.len();
                    arena.push(ArenaNode {
                        entry: entry.clone(),
                        children: Vec::new(),
                    });
                    let siblings = match parent {
                        Some(index) => &mut arena[index].children,
                        None => &mut roots,
                    };
                    siblings.insert(position, created);
                    created
                }
            };
            parent = Some(index);
        }
    }

    let mut built: Vec<Option<TreeNode<T>>> = Vec::with_capacity(arena.len());
    built.resize_with(arena.len(), || None);
    for (index, node) in arena.into_iter().enumerate().rev() {
        let children = node
            .children
            .iter()
            .filter_map(|child| built[*child].take())
            .collect();
        built[index] = Some(TreeNode {
            data: node.entry.data,
            extra: node.entry.extra,
            children,
        });
    }

    roots.iter().filter_map(|root| built[*root].take()).collect()
}

/// Scan the sibling level backward for a node to merge with.
///
/// The same source instance always merges. Otherwise `compare` decides, but
/// the scan stops at the first sibling whose category is not order
/// independent with the incoming entry. Wrappers only ever merge with their
/// own instance.
fn find_sibling<T, C>(
    arena: &[ArenaNode<T>],
    siblings: &[usize],
    entry: &TagListEntry<T>,
    options: &TagTreeOptions<T, C>,
) -> Option<usize>
where
    T: Clone,
    C: Copy + PartialEq,
{
    if let Some(same) = siblings
        .iter()
        .rev()
        .find(|index| arena[**index].entry.instance == entry.instance)
    {
        return Some(*same);
    }

    let incoming_wrapper = options.is_wrapper(&entry.data);
    let incoming_category = options.classify(&entry.data);

    for index in siblings.iter().rev() {
        let existing = &arena[*index].entry;
        if !incoming_wrapper
            && !options.is_wrapper(&existing.data)
            && options.compare(&existing.data, &entry.data)
        {
            return Some(*index);
        }
        if !options.independent(options.classify(&existing.data), incoming_category) {
            return None;
        }
    }
    None
}

/// Position for a new sibling: after the last sibling whose sort rank is
/// not greater than the incoming one
fn insertion_point<T, C>(
    arena: &[ArenaNode<T>],
    siblings: &[usize],
    entry: &TagListEntry<T>,
    options: &TagTreeOptions<T, C>,
) -> usize
where
    T: Clone,
    C: Copy + PartialEq,
{
    let Some(rank) = options.sort_rank(options.classify(&entry.data)) else {
        return siblings.len();
    };

    let mut position = siblings.len();
    while position > 0 {
        let existing = &arena[siblings[position - 1]].entry;
        match options.sort_rank(options.classify(&existing.data)) {
            Some(existing_rank) if existing_rank > rank => position -= 1,
            _ => break,
        }
    }
    position
}
