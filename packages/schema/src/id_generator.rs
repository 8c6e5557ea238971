use crate::kinds::{classify, TagCategory};
use crate::tag::TagNode;
use crc32fast::Hasher;
use wml_tagtree::TreeNode;

/// Stable seed for a document, derived from its asset path
pub fn get_document_id(path: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(path.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential identifiers within one document
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(path: &str) -> Self {
        Self {
            seed: get_document_id(path),
            count: 0,
        }
    }

    pub fn from_seed(seed: String) -> Self {
        Self { seed, count: 0 }
    }

    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

/// Give every entity, field and list item without an id a fresh one.
///
/// Existing ids are never replaced, so re-running over a tree that already
/// went through this is a no-op.
pub fn assign_missing_ids(tree: &mut [TagNode], ids: &mut IdGenerator) -> usize {
    let mut assigned = 0;
    let mut stack: Vec<&mut TagNode> = tree.iter_mut().rev().collect();
    while let Some(node) = stack.pop() {
        let TreeNode {
            data,
            extra,
            children,
        } = node;
        let anchored = matches!(
            classify(data),
            TagCategory::Entity | TagCategory::Field | TagCategory::ListItem
        );
        if anchored && extra.id.is_none() {
            extra.id = Some(ids.new_id());
            assigned += 1;
        }
        stack.extend(children.iter_mut().rev());
    }
    assigned
}
