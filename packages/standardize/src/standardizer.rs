//! # Standardizer
//!
//! Merges the documents describing one asset into a [`StandardForm`].
//!
//! Inputs are ordered from most inherited to most local. All of their
//! top-level content is flattened by one tag-tree engine; each component is
//! then folded from the paths whose nearest entity is that component, with
//! fields pulled in front of conditionals and list items, so that a later
//! document's `<If>` around an entity lands inside the matching field of the
//! earlier one.

use crate::edits::apply_edits;
use crate::error::{StandardizeError, StandardizeResult};
use crate::form::{ContainerKind, ImportOrigin, StandardComponent, StandardField, StandardForm};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument};
use wml_schema::{
    matchers, merge_text_runs, tag_tree, tag_tree_options, validate_tree, EntityKind, FieldKind, SchemaError, Tag,
    TagCategory, TagNode, WmlTree,
};
use wml_tagtree::{NodeExtra, TagList, TagListEntry, TagTree, TagTreeMatch, TreeNode, MAX_DEPTH};

/// Standardizes an ordered list of documents for one asset
#[derive(Debug, Clone)]
pub struct Standardizer {
    inputs: Vec<WmlTree>,
}

/// Keys discovered while scanning paths, per kind in first-appearance order
#[derive(Default)]
struct KeyIndex {
    kinds: HashMap<String, EntityKind>,
    by_kind: BTreeMap<EntityKind, Vec<String>>,
}

impl KeyIndex {
    fn observe(&mut self, kind: EntityKind, key: &str) -> StandardizeResult<()> {
        match self.kinds.get(key) {
            Some(existing) if *existing != kind => {
                Err(SchemaError::kind_conflict(key, existing.name(), kind.name()).into())
            }
            Some(_) => Ok(()),
            None => {
                self.kinds.insert(key.to_string(), kind);
                self.by_kind.entry(kind).or_default().push(key.to_string());
                Ok(())
            }
        }
    }

    /// (kind, key) pairs in global kind order
    fn ordered(&self) -> impl Iterator<Item = (EntityKind, &str)> {
        self.by_kind
            .iter()
            .flat_map(|(kind, keys)| keys.iter().map(move |key| (*kind, key.as_str())))
    }
}

impl Standardizer {
    pub fn new(inputs: Vec<WmlTree>) -> Self {
        Self { inputs }
    }

    #[instrument(skip(self), fields(inputs = self.inputs.len()))]
    pub fn standardize(&self) -> StandardizeResult<StandardForm> {
        for input in &self.inputs {
            validate_tree(input)?;
        }

        let (key, kind) = self.container()?;
        let combined = self.combined_content()?;
        let lists = tag_tree(&combined)?.tag_list();

        // Paths through an <Import> or <Export> are declarations, kept from
        // the declaration down
        let mut metadata: Vec<TagList<Tag>> = Vec::new();
        let mut content: Vec<TagList<Tag>> = Vec::new();
        for list in lists {
            match list.iter().position(is_declaration) {
                Some(start) => metadata.push(list[start..].to_vec()),
                None => content.push(list),
            }
        }

        let mut index = KeyIndex::default();
        for list in &content {
            for entry in list {
                if let Some(entity) = entry.data.as_entity() {
                    index.observe(entity.kind, entity.key)?;
                }
            }
        }

        let mut form = StandardForm::new(key, kind);
        let declarations = fold_lists(metadata)?;
        let mut origins: HashMap<String, (Tag, ImportOrigin)> = HashMap::new();
        for declaration in declarations {
            if let Tag::Import { from } = &declaration.data {
                for child in &declaration.children {
                    let Some(entity) = child.data.as_entity() else { continue };
                    index.observe(entity.kind, entity.key)?;
                    let origin = ImportOrigin {
                        asset: from.clone(),
                        key: entity.from.unwrap_or(entity.key).to_string(),
                    };
                    origins
                        .entry(entity.key.to_string())
                        .or_insert_with(|| (child.data.clone(), origin));
                }
            }
            let bucket = match declaration.data {
                Tag::Import { .. } => &mut form.imports,
                Tag::Export => &mut form.exports,
                _ => continue,
            };
            bucket.push(strip_inherited(declaration));
        }

        for (entity_kind, entity_key) in index.ordered() {
            let mut component = match self.component(&content, entity_kind, entity_key)? {
                Some(component) => component,
                None => match origins.get(entity_key) {
                    Some((tag, _)) => StandardComponent::empty(tag.clone())?,
                    None => continue,
                },
            };
            component.from = origins.get(entity_key).map(|(_, origin)| origin.clone());
            form.insert(component)?;
        }

        info!(key = %form.key, components = form.order.len(), "standardized");
        Ok(form)
    }

    /// Key and kind of the last input's container
    fn container(&self) -> StandardizeResult<(String, ContainerKind)> {
        let root = self
            .inputs
            .iter()
            .rev()
            .find_map(|tree| tree.first())
            .ok_or(StandardizeError::EmptyInput)?;
        match &root.data {
            Tag::Asset { key } => Ok((key.clone(), ContainerKind::Asset)),
            Tag::Character(keyed) => Ok((keyed.key.clone(), ContainerKind::Character)),
            other => Err(SchemaError::InvalidRoot {
                tag: other.name().to_string(),
            }
            .into()),
        }
    }

    /// All inputs as one forest: asset roots contribute their children,
    /// character roots themselves. `<Inherited>` wrappers are dissolved
    /// into provenance flags on their descendants.
    fn combined_content(&self) -> StandardizeResult<WmlTree> {
        let mut combined = Vec::new();
        for input in &self.inputs {
            for root in input {
                match root.data {
                    Tag::Asset { .. } => combined.extend(lift_inherited(&root.children, false, 1)?),
                    _ => combined.extend(lift_inherited(std::slice::from_ref(root), false, 0)?),
                }
            }
        }
        Ok(combined)
    }

    /// Fold the component for `kind`/`key` out of the content paths
    fn component(
        &self,
        content: &[TagList<Tag>],
        kind: EntityKind,
        key: &str,
    ) -> StandardizeResult<Option<StandardComponent>> {
        let lists: Vec<TagList<Tag>> = content
            .iter()
            .filter_map(|list| owned_path(list, kind, key))
            .collect();
        if lists.is_empty() {
            return Ok(None);
        }
        let lists = complete_split_conditionals(lists, kind, key);

        let target = matchers::entity(kind, key);
        let tree = TagTree::from_tag_lists(lists, tag_tree_options())?
            .reordered(vec![
                target.clone(),
                matchers::any_field(),
                TagTreeMatch::and(vec![
                    matchers::conditional(),
                    TagTreeMatch::any().before(TagTreeMatch::or(vec![target, matchers::any_field()])),
                ]),
            ])
            .reordered_siblings(vec![TagCategory::Field, TagCategory::ListItem, TagCategory::Entity])
            .tree();

        let mut roots = tree.into_iter().filter(|root| root.data.is_entity_of(kind, key));
        let Some(root) = roots.next() else {
            return Err(SchemaError::invariant(format!("no <{}> root folded for '{key}'", kind.name())).into());
        };
        let extra_roots: Vec<TagNode> = roots.collect();

        let mut component = StandardComponent::empty(root.data.clone())?;
        component.extra = NodeExtra {
            id: root.extra.id.clone(),
            inherited: false,
        };
        let children = root
            .children
            .into_iter()
            .chain(extra_roots.into_iter().flat_map(|extra| extra.children));
        for child in children {
            match FieldKind::of(&child.data).filter(|field| kind.has_field(*field)) {
                Some(field) => {
                    let slot = component
                        .fields
                        .iter_mut()
                        .find(|candidate| candidate.field == field)
                        .map(|candidate| &mut candidate.node);
                    match slot {
                        Some(node) => node.children.extend(child.children),
                        None => component.fields.push(StandardField { field, node: child }),
                    }
                }
                None => component.items.push(child),
            }
        }

        for field in &mut component.fields {
            let mut resolved = apply_edits(std::slice::from_ref(&field.node))?;
            merge_text_runs(&mut resolved);
            if let Some(node) = resolved.pop() {
                field.node = strip_inherited(node);
            }
        }
        let mut items = apply_edits(&component.items)?;
        merge_text_runs(&mut items);
        component.items = items.into_iter().map(strip_inherited).collect();

        debug!(
            kind = kind.name(),
            key,
            items = component.items.len(),
            "folded component"
        );
        Ok(Some(component))
    }
}

fn is_declaration(entry: &TagListEntry<Tag>) -> bool {
    matches!(entry.data, Tag::Import { .. } | Tag::Export)
}

fn is_conditional(tag: &Tag) -> bool {
    matches!(tag, Tag::If | Tag::Statement(_) | Tag::Fallthrough)
}

/// Rewrite one content path for the component `kind`/`key`.
///
/// Paths whose nearest entity is the target keep everything from the target
/// down, plus the conditionals above it. Paths running through the target
/// into a nested entity end at a bare reference to that entity. Paths that
/// never reach the target give `None`.
fn owned_path(list: &TagList<Tag>, kind: EntityKind, key: &str) -> Option<TagList<Tag>> {
    let target = list.iter().rposition(|entry| entry.data.is_entity_of(kind, key))?;
    if target + 1 == list.len() {
        return Some(vec![list[target].clone()]);
    }

    let mut path: TagList<Tag> = list[..target]
        .iter()
        .filter(|entry| is_conditional(&entry.data))
        .cloned()
        .collect();
    let nested = list[target + 1..]
        .iter()
        .position(|entry| entry.data.as_entity().is_some())
        .map(|offset| target + 1 + offset);
    match nested {
        None => path.extend(list[target..].iter().cloned()),
        Some(nested) => {
            path.extend(list[target..nested].iter().cloned());
            let reference = &list[nested];
            path.push(TagListEntry::new(
                reference.data.without_from(),
                NodeExtra::default(),
                reference.instance(),
            ));
        }
    }
    Some(path)
}

/// Slot a component path folds into: one of the kind's fields, or the item
/// list
fn slot_of(list: &TagList<Tag>, kind: EntityKind) -> Option<FieldKind> {
    list.iter()
        .find_map(|entry| FieldKind::of(&entry.data).filter(|field| kind.has_field(*field)))
}

fn ends_in_empty_branch(list: &TagList<Tag>) -> bool {
    matches!(
        list.as_slice(),
        [.., wrapper, branch]
            if wrapper.data == Tag::If && matches!(branch.data, Tag::Statement(_) | Tag::Fallthrough)
    )
}

/// Record that every `<If>` on `list` reaches `slot`
fn note_reach(reach: &mut HashMap<u64, Vec<Option<FieldKind>>>, list: &TagList<Tag>, slot: Option<FieldKind>) {
    for wrapper in list.iter().filter(|entry| entry.data == Tag::If) {
        let reached = reach.entry(wrapper.instance()).or_default();
        if !reached.contains(&slot) {
            reached.push(slot);
        }
    }
}

/// One branch of an `<If>` chain, as first seen
struct BranchSite {
    wrapper: u64,
    branch: u64,
    first: usize,
    prefix: TagList<Tag>,
}

/// Give every slot an `<If>` chain reaches the chain's missing branches.
///
/// A chain whose branches hold different fields, or fields and list items,
/// folds into one `<If>` per slot. Each copy gets the branches it lacks as
/// empty placeholders, in chain order, so branch selection sees the whole
/// chain wherever it landed. A path ending at an empty branch belongs to
/// every slot its chain reaches, and to the item list when there is none.
fn complete_split_conditionals(lists: Vec<TagList<Tag>>, kind: EntityKind, key: &str) -> Vec<TagList<Tag>> {
    let slots: Vec<Option<FieldKind>> = lists.iter().map(|list| slot_of(list, kind)).collect();
    let floating: Vec<bool> = lists
        .iter()
        .zip(&slots)
        .map(|(list, slot)| slot.is_none() && ends_in_empty_branch(list))
        .collect();

    let mut reach: HashMap<u64, Vec<Option<FieldKind>>> = HashMap::new();
    for (index, list) in lists.iter().enumerate() {
        if !floating[index] {
            note_reach(&mut reach, list, slots[index]);
        }
    }
    let kept: Vec<bool> = lists
        .iter()
        .enumerate()
        .map(|(index, list)| {
            !floating[index] || !reach.contains_key(&list[list.len() - 2].instance())
        })
        .collect();
    for (index, list) in lists.iter().enumerate() {
        if floating[index] && kept[index] {
            note_reach(&mut reach, list, None);
        }
    }

    let mut sites: Vec<BranchSite> = Vec::new();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut present: HashSet<(u64, Option<FieldKind>)> = HashSet::new();
    for (index, list) in lists.iter().enumerate() {
        for position in 1..list.len() {
            if list[position - 1].data != Tag::If {
                continue;
            }
            let branch = list[position].instance();
            if kept[index] {
                present.insert((branch, slots[index]));
            }
            if seen.insert(branch) {
                sites.push(BranchSite {
                    wrapper: list[position - 1].instance(),
                    branch,
                    first: index,
                    prefix: list[..=position].to_vec(),
                });
            }
        }
    }

    let target = lists
        .iter()
        .flatten()
        .find(|entry| entry.data.is_entity_of(kind, key))
        .cloned();
    let mut field_entries: HashMap<FieldKind, TagListEntry<Tag>> = HashMap::new();
    for (list, slot) in lists.iter().zip(&slots) {
        let Some(field) = slot else { continue };
        if let Some(entry) = list.iter().find(|entry| FieldKind::of(&entry.data) == Some(*field)) {
            field_entries.entry(*field).or_insert_with(|| entry.clone());
        }
    }

    let mut ordered: Vec<(usize, TagList<Tag>)> = lists
        .into_iter()
        .enumerate()
        .filter(|(index, _)| kept[*index])
        .collect();
    let mut placeholders = 0usize;
    for site in &sites {
        let Some(reached) = reach.get(&site.wrapper) else { continue };
        for slot in reached {
            if present.contains(&(site.branch, *slot)) {
                continue;
            }
            let mut path = site.prefix.clone();
            if let Some(target) = &target {
                if !path.iter().any(|entry| entry.data.is_entity_of(kind, key)) {
                    path.push(target.clone());
                }
            }
            if let Some(entry) = (*slot).and_then(|field| field_entries.get(&field)) {
                if !path.iter().any(|existing| FieldKind::of(&existing.data).is_some()) {
                    path.push(entry.clone());
                }
            }
            ordered.push((site.first, path));
            placeholders += 1;
        }
    }
    if placeholders > 0 {
        debug!(kind = kind.name(), key, placeholders, "completed split conditionals");
    }

    ordered.sort_by_key(|(first, _)| *first);
    ordered.into_iter().map(|(_, list)| list).collect()
}

fn fold_lists(lists: Vec<TagList<Tag>>) -> StandardizeResult<WmlTree> {
    if lists.is_empty() {
        return Ok(Vec::new());
    }
    Ok(TagTree::from_tag_lists(lists, tag_tree_options())?.tree())
}

/// Copy of `nodes` with `<Inherited>` wrappers dissolved and their
/// descendants flagged as inherited
fn lift_inherited(nodes: &[TagNode], inherited: bool, depth: usize) -> StandardizeResult<WmlTree> {
    if depth > MAX_DEPTH {
        return Err(SchemaError::MaxNestingDepthExceeded { max_depth: MAX_DEPTH }.into());
    }
    let mut lifted = Vec::with_capacity(nodes.len());
    for node in nodes {
        if node.data == Tag::Inherited {
            lifted.extend(lift_inherited(&node.children, true, depth + 1)?);
            continue;
        }
        let inherited = inherited || node.extra.inherited;
        let extra = NodeExtra {
            id: node.extra.id.clone(),
            inherited,
        };
        lifted.push(
            TreeNode::new(node.data.clone())
                .with_extra(extra)
                .with_children(lift_inherited(&node.children, inherited, depth + 1)?),
        );
    }
    Ok(lifted)
}

/// Clear provenance flags on a whole subtree
fn strip_inherited(mut node: TagNode) -> TagNode {
    let mut stack: Vec<&mut TagNode> = vec![&mut node];
    while let Some(current) = stack.pop() {
        current.extra.inherited = false;
        stack.extend(current.children.iter_mut());
    }
    node
}
