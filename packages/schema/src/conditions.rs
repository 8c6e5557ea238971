//! Branch selection for conditional chains.

use crate::error::{SchemaError, SchemaResult};
use crate::tag::{Tag, TagNode};

/// Outcome of resolving one `<If>` chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchSelection<'a> {
    /// A statement whose condition held
    Statement(&'a TagNode),
    /// No statement held; the first `<Else>` applies
    Fallthrough(&'a TagNode),
    /// Nothing applies and there is no `<Else>`
    Unresolved,
}

impl<'a> BranchSelection<'a> {
    /// Children of the selected branch, empty when unresolved
    pub fn contents(&self) -> &'a [TagNode] {
        match self {
            BranchSelection::Statement(branch) | BranchSelection::Fallthrough(branch) => &branch.children,
            BranchSelection::Unresolved => &[],
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, BranchSelection::Unresolved)
    }
}

/// Pick the branch of `wrapper` that applies.
///
/// Statements are tried in order with `evaluate`; if none holds the first
/// fallthrough wins, otherwise the chain stays unresolved.
pub fn select_branch<'a>(
    wrapper: &'a TagNode,
    mut evaluate: impl FnMut(&str) -> bool,
) -> SchemaResult<BranchSelection<'a>> {
    if !matches!(wrapper.data, Tag::If) {
        return Err(SchemaError::invariant(format!(
            "branch selection on <{}>",
            wrapper.data.name()
        )));
    }

    let mut fallthrough = None;
    for branch in &wrapper.children {
        match &branch.data {
            Tag::Statement(statement) => {
                if evaluate(&statement.condition) {
                    return Ok(BranchSelection::Statement(branch));
                }
            }
            Tag::Fallthrough => {
                fallthrough.get_or_insert(branch);
            }
            other => {
                return Err(SchemaError::invariant(format!(
                    "<{}> inside a conditional chain",
                    other.name()
                )))
            }
        }
    }

    Ok(fallthrough.map_or(BranchSelection::Unresolved, BranchSelection::Fallthrough))
}
