use crate::tag::{ComputedTag, StatementTag, Tag, TagNode};
use wml_tagtree::{NodeExtra, TreeNode};

/// Visitor over typed trees
///
/// Walks are pre-order and iterative, so arbitrarily deep trees cannot
/// overflow the stack. Override the `visit_*` hooks you care about; the
/// default `visit_tag` dispatches to them.
pub trait Visitor: Sized {
    fn visit_tree(&mut self, tree: &[TagNode]) {
        walk_tree(self, tree);
    }

    fn visit_tag(&mut self, tag: &Tag, extra: &NodeExtra) {
        match tag {
            Tag::Statement(statement) => self.visit_statement(statement),
            Tag::Computed(computed) => self.visit_computed(computed),
            Tag::Text { value } => self.visit_text(value),
            other => {
                if let Some(entity) = other.as_entity() {
                    self.visit_entity(other, entity.key, extra);
                }
            }
        }
    }

    fn visit_entity(&mut self, _tag: &Tag, _key: &str, _extra: &NodeExtra) {}

    fn visit_statement(&mut self, _statement: &StatementTag) {}

    fn visit_computed(&mut self, _computed: &ComputedTag) {}

    fn visit_text(&mut self, _value: &str) {}
}

/// Mutable counterpart of [`Visitor`]
pub trait VisitorMut: Sized {
    fn visit_tree_mut(&mut self, tree: &mut [TagNode]) {
        walk_tree_mut(self, tree);
    }

    fn visit_tag_mut(&mut self, tag: &mut Tag, extra: &mut NodeExtra) {
        match tag {
            Tag::Statement(statement) => self.visit_statement_mut(statement),
            Tag::Computed(computed) => self.visit_computed_mut(computed),
            _ => self.visit_other_mut(tag, extra),
        }
    }

    fn visit_statement_mut(&mut self, _statement: &mut StatementTag) {}

    fn visit_computed_mut(&mut self, _computed: &mut ComputedTag) {}

    fn visit_other_mut(&mut self, _tag: &mut Tag, _extra: &mut NodeExtra) {}
}

pub fn walk_tree<V: Visitor>(visitor: &mut V, tree: &[TagNode]) {
    let mut stack: Vec<&TagNode> = tree.iter().rev().collect();
    while let Some(node) = stack.pop() {
        visitor.visit_tag(&node.data, &node.extra);
        stack.extend(node.children.iter().rev());
    }
}

pub fn walk_tree_mut<V: VisitorMut>(visitor: &mut V, tree: &mut [TagNode]) {
    let mut stack: Vec<&mut TagNode> = tree.iter_mut().rev().collect();
    while let Some(node) = stack.pop() {
        let TreeNode {
            data,
            extra,
            children,
        } = node;
        visitor.visit_tag_mut(data, extra);
        stack.extend(children.iter_mut().rev());
    }
}
