//! # Tag Tree
//!
//! Queries and rewrites over ordered trees, performed on the flattened
//! tag-list form instead of by recursive walks.
//!
//! Construction flattens the input into one list per terminal position, each
//! holding the ancestor chain from root to terminal. Every source node gets a
//! synthetic instance key at that point, which is how the fold-back
//! recognises the pieces of one wrapper group after filtering or reordering.
//! Instance keys are regenerated on every construction and never leave the
//! engine: folded trees carry only `data` and `extra`.
//!
//! Operations are queued, not executed: `filter`, `prune` and `reordered`
//! each return a new engine value. `tag_list()` replays the queue over the
//! flattened lists and `tree()` additionally folds the result back.

use crate::error::{TagTreeError, TagTreeResult};
use crate::matcher::TagTreeMatch;
use crate::merge::iterative_merge;
use crate::options::TagTreeOptions;
use crate::tree::{NodeExtra, Tree, TreeNode, MAX_DEPTH};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// One ancestor position within a flattened path
#[derive(Debug, Clone, PartialEq)]
pub struct TagListEntry<T> {
    pub data: T,
    pub extra: NodeExtra,
    pub(crate) instance: u64,
}

impl<T> TagListEntry<T> {
    pub fn new(data: T, extra: NodeExtra, instance: u64) -> Self {
        Self { data, extra, instance }
    }

    /// Synthetic key identifying the source node this entry came from
    pub fn instance(&self) -> u64 {
        self.instance
    }
}

/// A root-to-terminal path
pub type TagList<T> = Vec<TagListEntry<T>>;

#[derive(Clone, Debug)]
enum TagTreeAction<T> {
    Filter(TagTreeMatch<T>),
    Prune(TagTreeMatch<T>),
    Reorder(Vec<TagTreeMatch<T>>),
}

#[derive(Clone, Debug)]
pub struct TagTree<T, C> {
    options: TagTreeOptions<T, C>,
    source: Arc<Vec<TagList<T>>>,
    actions: Vec<TagTreeAction<T>>,
}

impl<T, C> TagTree<T, C>
where
    T: Clone,
    C: Copy + PartialEq,
{
    /// Flatten `tree` and check it is well formed
    pub fn new(tree: &Tree<T>, options: TagTreeOptions<T, C>) -> TagTreeResult<Self> {
        let source = flatten(tree, &options)?;
        Ok(Self {
            options,
            source: Arc::new(source),
            actions: Vec::new(),
        })
    }

    /// Build from already flattened lists, keeping their instance keys
    pub fn from_tag_lists(lists: Vec<TagList<T>>, options: TagTreeOptions<T, C>) -> TagTreeResult<Self> {
        for list in &lists {
            if list.len() > MAX_DEPTH {
                return Err(TagTreeError::depth_exceeded(MAX_DEPTH));
            }
            if let Some(last) = list.last() {
                if options.is_wrapper(&last.data) {
                    return Err(TagTreeError::malformed_wrapper(list.len() - 1));
                }
            }
        }
        Ok(Self {
            options,
            source: Arc::new(lists),
            actions: Vec::new(),
        })
    }

    pub fn options(&self) -> &TagTreeOptions<T, C> {
        &self.options
    }

    /// Keep only paths satisfying `expr`, preserving wrapper groups
    pub fn filter(&self, expr: TagTreeMatch<T>) -> Self {
        self.with_action(TagTreeAction::Filter(expr))
    }

    /// Strip matching ancestors out of every path
    pub fn prune(&self, expr: TagTreeMatch<T>) -> Self {
        self.with_action(TagTreeAction::Prune(expr))
    }

    /// Within the window the expressions match, move matched entries to the
    /// front, highest priority first
    pub fn reordered(&self, priorities: Vec<TagTreeMatch<T>>) -> Self {
        self.with_action(TagTreeAction::Reorder(priorities))
    }

    /// Category priority applied when new siblings are inserted at fold time
    pub fn reordered_siblings(&self, order: Vec<C>) -> Self {
        let mut next = self.clone();
        next.options = next.options.with_order_sort(order);
        next
    }

    /// Replay queued actions over the flattened lists
    pub fn tag_list(&self) -> Vec<TagList<T>> {
        let mut lists: Vec<TagList<T>> = self.source.as_ref().clone();
        for action in &self.actions {
            lists = match action {
                TagTreeAction::Filter(expr) => self.apply_filter(lists, expr),
                TagTreeAction::Prune(expr) => apply_prune(lists, expr),
                TagTreeAction::Reorder(priorities) => apply_reorder(lists, priorities),
            };
        }
        lists
    }

    /// Replay queued actions and fold the result back into a tree
    #[instrument(skip(self), fields(paths = self.source.len(), actions = self.actions.len()))]
    pub fn tree(&self) -> Tree<T> {
        let lists = self.tag_list();
        debug!(surviving = lists.len(), "folding tag lists");
        iterative_merge(&lists, &self.options)
    }

    fn with_action(&self, action: TagTreeAction<T>) -> Self {
        let mut next = self.clone();
        next.actions.push(action);
        next
    }

    fn apply_filter(&self, lists: Vec<TagList<T>>, expr: &TagTreeMatch<T>) -> Vec<TagList<T>> {
        let keep: Vec<bool> = lists.iter().map(|list| expr.matches(list)).collect();

        // Wrapper instances with at least one surviving path, and the branch
        // instances (direct wrapper children) that survive.
        let mut live_wrappers = HashSet::new();
        let mut live_branches = HashSet::new();
        for (list, kept) in lists.iter().zip(&keep) {
            if !*kept {
                continue;
            }
            for (index, entry) in list.iter().enumerate() {
                if self.options.is_wrapper(&entry.data) {
                    live_wrappers.insert(entry.instance);
                    if let Some(branch) = list.get(index + 1) {
                        live_branches.insert(branch.instance);
                    }
                }
            }
        }

        let mut placed = HashSet::new();
        let mut output = Vec::with_capacity(lists.len());
        for (list, kept) in lists.into_iter().zip(keep) {
            if kept {
                output.push(list);
                continue;
            }
            if let Some(placeholder) = self.placeholder(&list, &live_wrappers, &live_branches, &mut placed) {
                output.push(placeholder);
            }
        }
        output
    }

    /// Path standing in for a dropped branch of a wrapper that still has
    /// survivors elsewhere
    fn placeholder(
        &self,
        list: &TagList<T>,
        live_wrappers: &HashSet<u64>,
        live_branches: &HashSet<u64>,
        placed: &mut HashSet<u64>,
    ) -> Option<TagList<T>> {
        for (index, entry) in list.iter().enumerate() {
            if !self.options.is_wrapper(&entry.data) || !live_wrappers.contains(&entry.instance) {
                continue;
            }
            let branch = list.get(index + 1)?;
            if live_branches.contains(&branch.instance) {
                continue;
            }
            if !placed.insert(branch.instance) {
                return None;
            }
            // A wrapper cannot terminate a path, so a wrapper branch keeps
            // its whole original path.
            if self.options.is_wrapper(&branch.data) {
                return Some(list.clone());
            }
            return Some(list[..=index + 1].to_vec());
        }
        None
    }
}

fn apply_prune<T: Clone>(lists: Vec<TagList<T>>, expr: &TagTreeMatch<T>) -> Vec<TagList<T>> {
    lists
        .into_iter()
        .filter_map(|list| {
            let mask = expr.anchors(&list);
            let pruned: TagList<T> = list
                .into_iter()
                .zip(mask)
                .filter_map(|(entry, hit)| (!hit).then_some(entry))
                .collect();
            (!pruned.is_empty()).then_some(pruned)
        })
        .collect()
}

fn apply_reorder<T: Clone>(lists: Vec<TagList<T>>, priorities: &[TagTreeMatch<T>]) -> Vec<TagList<T>> {
    lists
        .into_iter()
        .map(|list| reorder_list(list, priorities))
        .collect()
}

fn reorder_list<T: Clone>(list: TagList<T>, priorities: &[TagTreeMatch<T>]) -> TagList<T> {
    let masks: Vec<Vec<bool>> = priorities.iter().map(|expr| expr.anchors(&list)).collect();
    let hit = |index: usize| masks.iter().any(|mask| mask[index]);

    let Some(low) = (0..list.len()).find(|index| hit(*index)) else {
        return list;
    };
    let high = (0..list.len()).rev().find(|index| hit(*index)).unwrap_or(low);

    let mut order = Vec::with_capacity(list.len());
    let mut taken = vec![false; list.len()];
    order.extend(0..low);
    for mask in &masks {
        for index in low..=high {
            if mask[index] && !taken[index] {
                taken[index] = true;
                order.push(index);
            }
        }
    }
    order.extend((low..=high).filter(|index| !taken[*index]));
    order.extend(high + 1..list.len());

    let mut slots: Vec<Option<TagListEntry<T>>> = list.into_iter().map(Some).collect();
    order.into_iter().filter_map(|index| slots[index].take()).collect()
}

/// Flatten a forest into root-to-terminal paths, assigning instance keys
pub(crate) fn flatten<T: Clone, C: Copy + PartialEq>(
    tree: &Tree<T>,
    options: &TagTreeOptions<T, C>,
) -> TagTreeResult<Vec<TagList<T>>> {
    let mut lists = Vec::new();
    let mut path: TagList<T> = Vec::new();
    let mut next_instance = 0u64;
    let mut stack: Vec<(&TreeNode<T>, usize)> = tree.iter().rev().map(|node| (node, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        if depth >= MAX_DEPTH {
            return Err(TagTreeError::depth_exceeded(MAX_DEPTH));
        }
        path.truncate(depth);
        path.push(TagListEntry::new(node.data.clone(), node.extra.clone(), next_instance));
        next_instance += 1;

        if node.children.is_empty() {
            if options.is_wrapper(&node.data) {
                return Err(TagTreeError::malformed_wrapper(depth));
            }
            lists.push(path.clone());
        } else {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }

    Ok(lists)
}

/// Group consecutive lists by the instance of their first entry.
///
/// Callers use this to split a flattened forest back into its top-level
/// subtrees without folding.
pub fn group_by_root<T: Clone>(lists: &[TagList<T>]) -> Vec<Vec<TagList<T>>> {
    let mut groups: Vec<Vec<TagList<T>>> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();
    for list in lists {
        let Some(root) = list.first() else { continue };
        match positions.get(&root.instance) {
            Some(&index) => groups[index].push(list.clone()),
            None => {
                positions.insert(root.instance, groups.len());
                groups.push(vec![list.clone()]);
            }
        }
    }
    groups
}
