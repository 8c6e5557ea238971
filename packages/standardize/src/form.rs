use crate::error::StandardizeResult;
use crate::records::StandardRecord;
use crate::standardizer::Standardizer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};
use wml_schema::{
    assign_dependencies, merge_text_runs, tag_tree, EntityKind, FieldKind, SchemaError, Tag, TagNode, WmlMatch,
    WmlTree,
};
use wml_tagtree::{NodeExtra, TreeNode};

/// Top-level container of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    Asset,
    Character,
}

/// Where an imported component came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOrigin {
    /// Key of the source asset
    pub asset: String,
    /// Key of the component inside the source asset
    pub key: String,
}

/// One named field of a component; the node is always rooted at the
/// field's own tag, even when it has no content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardField {
    pub field: FieldKind,
    pub node: TagNode,
}

impl StandardField {
    pub fn shell(field: FieldKind) -> Self {
        Self {
            field,
            node: TreeNode::new(field.tag()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node.children.is_empty()
    }
}

/// Everything known about one key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardComponent {
    pub kind: EntityKind,
    pub key: String,
    /// The merged entity tag, import origin cleared
    pub tag: Tag,
    #[serde(default, skip_serializing_if = "NodeExtra::is_empty")]
    pub extra: NodeExtra,
    /// Declared fields in declared order
    pub fields: Vec<StandardField>,
    /// List-valued children: exits, positions, pronouns, nested entity
    /// references and conditionals around them
    pub items: Vec<TagNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ImportOrigin>,
}

impl StandardComponent {
    /// A component with an empty shell for every declared field
    pub fn empty(tag: Tag) -> StandardizeResult<Self> {
        let entity = tag
            .as_entity()
            .ok_or_else(|| SchemaError::invariant(format!("<{}> is not an entity", tag.name())))?;
        let (kind, key) = (entity.kind, entity.key.to_string());
        Ok(Self {
            kind,
            key,
            tag: tag.without_from(),
            extra: NodeExtra::default(),
            fields: kind.fields().iter().copied().map(StandardField::shell).collect(),
            items: Vec::new(),
            from: None,
        })
    }

    pub fn field(&self, field: FieldKind) -> Option<&TagNode> {
        self.fields
            .iter()
            .find(|candidate| candidate.field == field)
            .map(|candidate| &candidate.node)
    }

    fn field_mut(&mut self, field: FieldKind) -> Option<&mut TagNode> {
        self.fields
            .iter_mut()
            .find(|candidate| candidate.field == field)
            .map(|candidate| &mut candidate.node)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.fields.iter().all(StandardField::is_empty)
    }

    /// Empty and fully covered by an import
    pub fn is_elided(&self) -> bool {
        self.from.is_some() && self.is_empty()
    }

    /// The component as a tree node: populated fields, then list items
    pub fn to_node(&self) -> TagNode {
        let mut children: Vec<TagNode> = self
            .fields
            .iter()
            .filter(|field| !field.is_empty())
            .map(|field| field.node.clone())
            .collect();
        children.extend(self.items.iter().cloned());
        TreeNode::new(self.tag.clone())
            .with_extra(self.extra.clone())
            .with_children(children)
    }

    /// Concatenate `local` after `self`
    fn absorb(&mut self, local: &StandardComponent) {
        self.tag = local.tag.clone();
        if self.extra.id.is_none() {
            self.extra.id = local.extra.id.clone();
        }
        for field in &local.fields {
            match self.field_mut(field.field) {
                Some(node) => node.children.extend(field.node.children.iter().cloned()),
                None => self.fields.push(field.clone()),
            }
        }
        self.items.extend(local.items.iter().cloned());
        if self.from.is_none() {
            self.from = local.from.clone();
        }
        for field in &mut self.fields {
            merge_text_runs(&mut field.node.children);
        }
    }

    fn map_subtrees(&self, transform: &impl Fn(&[TagNode]) -> StandardizeResult<WmlTree>) -> StandardizeResult<Self> {
        let mut next = self.clone();
        for field in &mut next.fields {
            let root = field.field.tag();
            let result = transform(std::slice::from_ref(&field.node))?;
            field.node = match <[TagNode; 1]>::try_from(result) {
                Ok([single]) if single.data == root => single,
                Ok([other]) => TreeNode::new(root).with_children(vec![other]),
                Err(forest) => TreeNode::new(root).with_children(forest),
            };
        }
        next.items = transform(&self.items)?;
        Ok(next)
    }
}

/// Canonical per-key form of one asset or character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardForm {
    pub key: String,
    pub kind: ContainerKind,
    /// Components by key
    pub by_id: BTreeMap<String, StandardComponent>,
    /// Keys in emission order: kind by kind, first appearance within a kind
    pub order: Vec<String>,
    /// `<Import>` declarations
    pub imports: Vec<TagNode>,
    /// `<Export>` declarations
    pub exports: Vec<TagNode>,
}

impl StandardForm {
    pub fn new(key: impl Into<String>, kind: ContainerKind) -> Self {
        Self {
            key: key.into(),
            kind,
            by_id: BTreeMap::new(),
            order: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    pub fn component(&self, key: &str) -> Option<&StandardComponent> {
        self.by_id.get(key)
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn imports(&self) -> &[TagNode] {
        &self.imports
    }

    pub fn exports(&self) -> &[TagNode] {
        &self.exports
    }

    /// Components in emission order
    pub fn components(&self) -> impl Iterator<Item = &StandardComponent> {
        self.order.iter().filter_map(|key| self.by_id.get(key))
    }

    pub(crate) fn insert(&mut self, component: StandardComponent) -> StandardizeResult<()> {
        if let Some(existing) = self.by_id.get(&component.key) {
            if existing.kind != component.kind {
                return Err(SchemaError::kind_conflict(
                    component.key.clone(),
                    existing.kind.name(),
                    component.kind.name(),
                )
                .into());
            }
        }
        if !self.by_id.contains_key(&component.key) {
            self.order.push(component.key.clone());
        }
        self.by_id.insert(component.key.clone(), component);
        Ok(())
    }

    fn sort_order(&mut self) {
        let by_id = &self.by_id;
        self.order
            .sort_by_key(|key| by_id.get(key).map(|component| component.kind));
    }

    /// The form as one ordered tree: imports, components kind by kind, then
    /// exports. Empty import-covered components are left out.
    pub fn schema(&self) -> WmlTree {
        let mut children = self.imports.clone();
        match self.kind {
            ContainerKind::Asset => {
                children.extend(
                    self.components()
                        .filter(|component| !component.is_elided())
                        .map(StandardComponent::to_node),
                );
                children.extend(self.exports.iter().cloned());
                vec![TreeNode::new(Tag::asset(self.key.clone())).with_children(children)]
            }
            ContainerKind::Character => {
                let root = match self.by_id.get(&self.key) {
                    Some(component) => component.to_node(),
                    None => TreeNode::new(Tag::character(self.key.clone())),
                };
                children.extend(root.children);
                vec![TreeNode {
                    data: root.data,
                    extra: root.extra,
                    children,
                }]
            }
        }
    }

    /// Annotate every condition and computed expression with
    /// `extract(expression)` and standardize again
    pub fn assign_dependencies(&self, extract: impl FnMut(&str) -> Vec<String>) -> StandardizeResult<StandardForm> {
        let mut tree = self.schema();
        assign_dependencies(&mut tree, extract);
        Standardizer::new(vec![tree]).standardize()
    }

    /// Key-space union with `other` layered on top.
    ///
    /// Keys present on one side only copy through unchanged. Shared keys
    /// concatenate field contents and list items, `self` first.
    #[instrument(skip_all, fields(base = %self.key, local = %other.key))]
    pub fn merge(&self, other: &StandardForm) -> StandardizeResult<StandardForm> {
        let mut merged = StandardForm::new(other.key.clone(), other.kind);
        merged.by_id = self.by_id.clone();
        merged.order = self.order.clone();

        let mut shared = 0usize;
        for component in other.components() {
            match merged.by_id.get_mut(&component.key) {
                Some(existing) if existing.kind != component.kind => {
                    return Err(SchemaError::kind_conflict(
                        component.key.clone(),
                        existing.kind.name(),
                        component.kind.name(),
                    )
                    .into());
                }
                Some(existing) => {
                    existing.absorb(component);
                    shared += 1;
                }
                None => merged.insert(component.clone())?,
            }
        }
        merged.sort_order();

        merged.imports = fold_declarations([self.imports.as_slice(), other.imports.as_slice()].concat())?;
        merged.exports = fold_declarations([self.exports.as_slice(), other.exports.as_slice()].concat())?;
        debug!(shared, total = merged.order.len(), "merged standard forms");
        Ok(merged)
    }

    /// Keep only matching paths in every component subtree
    pub fn filter(&self, expr: WmlMatch) -> StandardizeResult<StandardForm> {
        self.map_components(|nodes| Ok(tag_tree(&nodes.to_vec())?.filter(expr.clone()).tree()))
    }

    /// Strip matching nodes out of every component subtree
    pub fn prune(&self, expr: WmlMatch) -> StandardizeResult<StandardForm> {
        self.map_components(|nodes| Ok(tag_tree(&nodes.to_vec())?.prune(expr.clone()).tree()))
    }

    fn map_components(
        &self,
        transform: impl Fn(&[TagNode]) -> StandardizeResult<WmlTree>,
    ) -> StandardizeResult<StandardForm> {
        let mut next = self.clone();
        for component in next.by_id.values_mut() {
            *component = component.map_subtrees(&transform)?;
        }
        Ok(next)
    }

    /// Records for an external store, in emission order
    pub fn records(&self) -> Vec<StandardRecord> {
        self.components().map(StandardRecord::from).collect()
    }
}

/// Fold `<Import>`/`<Export>` declarations so repeated sources collapse
pub(crate) fn fold_declarations(nodes: Vec<TagNode>) -> StandardizeResult<Vec<TagNode>> {
    if nodes.is_empty() {
        return Ok(nodes);
    }
    Ok(tag_tree(&nodes)?.tree())
}

