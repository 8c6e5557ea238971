use serde::{Deserialize, Serialize};

/// Hard bound on nesting for every tree walk in the workspace.
pub const MAX_DEPTH: usize = 200;

/// Optional payload riding along with a node's data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExtra {
    /// Stable identifier used to anchor edits across versions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Provenance marker: content came from a base definition
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub inherited: bool,
}

impl NodeExtra {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            inherited: false,
        }
    }

    pub fn inherited() -> Self {
        Self {
            id: None,
            inherited: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && !self.inherited
    }
}

/// One node of an ordered tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "NodeExtra::is_empty")]
    pub extra: NodeExtra,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    pub children: Tree<T>,
}

/// An ordered forest
pub type Tree<T> = Vec<TreeNode<T>>;

impl<T> TreeNode<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            extra: NodeExtra::default(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Tree<T>) -> Self {
        self.children = children;
        self
    }

    pub fn with_extra(mut self, extra: NodeExtra) -> Self {
        self.extra = extra;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of levels below and including this node
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}

impl<T: Clone> TreeNode<T> {
    /// Copy of this subtree with every extra payload cleared
    pub fn without_extras(&self) -> TreeNode<T> {
        let mut copy = self.clone();
        clear_extras(std::slice::from_mut(&mut copy));
        copy
    }
}

fn clear_extras<T>(tree: &mut [TreeNode<T>]) {
    let mut stack: Vec<&mut TreeNode<T>> = tree.iter_mut().collect();
    while let Some(node) = stack.pop() {
        node.extra = NodeExtra::default();
        stack.extend(node.children.iter_mut());
    }
}

/// Copy of a forest with every extra payload cleared
pub fn strip_extras<T: Clone>(tree: &Tree<T>) -> Tree<T> {
    let mut stripped = tree.clone();
    clear_extras(&mut stripped);
    stripped
}

/// Equality that ignores extra payloads
pub fn structurally_equal<T: PartialEq>(a: &Tree<T>, b: &Tree<T>) -> bool {
    let mut stack: Vec<(&Tree<T>, &Tree<T>)> = vec![(a, b)];
    while let Some((left, right)) = stack.pop() {
        if left.len() != right.len() {
            return false;
        }
        for (l, r) in left.iter().zip(right) {
            if l.data != r.data {
                return false;
            }
            stack.push((&l.children, &r.children));
        }
    }
    true
}

/// Apply `f` to every node's data, preserving shape and extras
pub fn map_tree<T, U>(tree: &Tree<T>, f: &impl Fn(&T) -> U) -> Tree<U> {
    // One frame per open sibling list: the node owning it (none for the
    // forest itself), the unvisited siblings, and the mapped ones so far.
    type Frame<'a, T, U> = (Option<&'a TreeNode<T>>, std::slice::Iter<'a, TreeNode<T>>, Tree<U>);
    let mut stack: Vec<Frame<'_, T, U>> = vec![(None, tree.iter(), Vec::with_capacity(tree.len()))];

    while let Some((_, siblings, _)) = stack.last_mut() {
        if let Some(node) = siblings.next() {
            stack.push((Some(node), node.children.iter(), Vec::with_capacity(node.children.len())));
            continue;
        }
        let Some((owner, _, children)) = stack.pop() else { break };
        let Some(owner) = owner else { return children };
        let mapped = TreeNode {
            data: f(&owner.data),
            extra: owner.extra.clone(),
            children,
        };
        if let Some((_, _, built)) = stack.last_mut() {
            built.push(mapped);
        }
    }
    Vec::new()
}
