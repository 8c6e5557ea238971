use crate::tag::{Tag, TagNode};

/// Join adjacent text siblings everywhere in the tree.
///
/// Two neighbouring text runs print as one, so a canonical tree never holds
/// them apart. Empty text nodes are dropped.
pub fn merge_text_runs(tree: &mut Vec<TagNode>) {
    let mut stack: Vec<&mut Vec<TagNode>> = vec![tree];
    while let Some(siblings) = stack.pop() {
        merge_siblings(siblings);
        for node in siblings.iter_mut() {
            stack.push(&mut node.children);
        }
    }
}

fn merge_siblings(siblings: &mut Vec<TagNode>) {
    let mut merged: Vec<TagNode> = Vec::with_capacity(siblings.len());
    for node in siblings.drain(..) {
        if let Tag::Text { value } = &node.data {
            if value.is_empty() && node.children.is_empty() {
                continue;
            }
            if let Some(Tag::Text { value: previous }) = merged.last_mut().map(|last| &mut last.data) {
                previous.push_str(value);
                continue;
            }
        }
        merged.push(node);
    }
    *siblings = merged;
}
