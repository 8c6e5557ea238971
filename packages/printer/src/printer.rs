use crate::error::{PrintError, PrintResult};
use crate::options::PrintOptions;
use crate::render::{collapse, indent_block, render, Part, PrintMapResult, PrintMode};
use crate::syntax::{escape_text, tag_properties, Element, Property};
use crate::wrap::{InlineUnit, WrapChunks};
use tracing::{debug, instrument};
use wml_schema::{SchemaError, Tag, TagNode};
use wml_standardize::StandardForm;
use wml_tagtree::MAX_DEPTH;

/// Prints canonical trees as WML text within a width budget
#[derive(Debug, Clone, Default)]
pub struct Printer {
    options: PrintOptions,
}

/// Tags whose children are free-running inline content
pub fn is_inline_container(tag: &Tag) -> bool {
    matches!(
        tag,
        Tag::Name | Tag::ShortName | Tag::Summary | Tag::Description | Tag::Link { .. }
    )
}

fn guard(depth: usize) -> PrintResult<()> {
    if depth > MAX_DEPTH {
        return Err(PrintError::MaxNestingDepthExceeded { max_depth: MAX_DEPTH });
    }
    Ok(())
}

fn first_naive(candidates: Vec<PrintMapResult>, tag: &Tag) -> PrintResult<String> {
    candidates
        .into_iter()
        .find(|candidate| candidate.mode == PrintMode::Naive)
        .map(|candidate| candidate.output)
        .ok_or_else(|| PrintError::empty_candidates(format!("inline <{}>", tag.name())))
}

impl Printer {
    pub fn new(options: PrintOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PrintOptions {
        &self.options
    }

    /// Print every root on its own line(s)
    #[instrument(skip_all, fields(roots = tree.len(), width = self.options.width))]
    pub fn print(&self, tree: &[TagNode]) -> PrintResult<String> {
        let mut output = String::new();
        for root in tree {
            let candidates = self.render_node(root, 0)?;
            let chosen = collapse(&candidates, 0, &self.options)?;
            debug!(tag = root.data.name(), mode = ?chosen.mode, "printed root");
            output.push_str(&chosen.output);
            output.push('\n');
        }
        Ok(output)
    }

    pub fn print_form(&self, form: &StandardForm) -> PrintResult<String> {
        self.print(&form.schema())
    }

    /// Candidate layouts for a node in block position, its first line
    /// starting `depth` levels in
    pub fn render_node(&self, node: &TagNode, depth: usize) -> PrintResult<Vec<PrintMapResult>> {
        guard(depth)?;
        match &node.data {
            Tag::Text { value } => Ok(vec![PrintMapResult::naive(escape_text(value))]),
            tag if is_inline_container(tag) => self.render_inline_container(node, depth),
            Tag::If => {
                let (element, parts) = self.conditional_parts(node, |child| {
                    Ok(Part::Child(self.render_node(child, depth + 1)?))
                })?;
                render(&element, &parts, depth, &self.options)
            }
            _ => {
                let parts = node
                    .children
                    .iter()
                    .map(|child| Ok(Part::Child(self.render_node(child, depth + 1)?)))
                    .collect::<PrintResult<Vec<_>>>()?;
                render(&Element::of(node), &parts, depth, &self.options)
            }
        }
    }

    /// A field or link: one line when it fits, otherwise its content
    /// word-wrapped one level in
    fn render_inline_container(&self, node: &TagNode, depth: usize) -> PrintResult<Vec<PrintMapResult>> {
        let element = Element::of(node);
        if node.children.is_empty() {
            return render(&element, &[], depth, &self.options);
        }

        let mut units = Vec::new();
        let mut content = String::new();
        for child in &node.children {
            match &child.data {
                Tag::Text { value } => {
                    content.push_str(&escape_text(value));
                    units.extend(value.chars().map(InlineUnit::Char));
                }
                _ => {
                    let atom = self.inline_atom(child, depth + 1)?;
                    content.push_str(&atom);
                    units.push(InlineUnit::Atom(atom));
                }
            }
        }

        let mut candidates = vec![PrintMapResult::naive(format!(
            "{}{content}{}",
            element.open(),
            element.close()
        ))];

        if let Some(chunks) = WrapChunks::split(&units) {
            let lines = chunks.fill(self.options.budget(depth + 1));
            candidates.push(PrintMapResult::new(
                PrintMode::Nested,
                format!(
                    "{}\n{}\n{}",
                    element.open(),
                    indent_block(&lines.join("\n"), &self.options.indent),
                    element.close()
                ),
            ));
        }
        Ok(candidates)
    }

    /// Single-line rendering of a node inside inline content
    fn inline_atom(&self, node: &TagNode, depth: usize) -> PrintResult<String> {
        guard(depth)?;
        let atom_part = |child: &TagNode| -> PrintResult<Part> {
            Ok(Part::Child(vec![PrintMapResult::naive(self.inline_atom(child, depth + 1)?)]))
        };
        let candidates = match &node.data {
            Tag::Text { value } => return Ok(escape_text(value)),
            Tag::If => {
                let (element, parts) = self.conditional_parts(node, atom_part)?;
                render(&element, &parts, depth, &self.options)?
            }
            _ => {
                let parts = node
                    .children
                    .iter()
                    .map(atom_part)
                    .collect::<PrintResult<Vec<_>>>()?;
                render(&Element::of(node), &parts, depth, &self.options)?
            }
        };
        first_naive(candidates, &node.data)
    }

    /// `<If {first}>…<ElseIf {next} />…<Else />…</If>`: the first
    /// statement's condition moves onto the opening tag, later branches
    /// become dividers
    fn conditional_parts(
        &self,
        node: &TagNode,
        mut child_part: impl FnMut(&TagNode) -> PrintResult<Part>,
    ) -> PrintResult<(Element, Vec<Part>)> {
        let mut properties = Vec::new();
        let mut parts = Vec::new();
        for (index, branch) in node.children.iter().enumerate() {
            match &branch.data {
                Tag::Statement(_) if index == 0 => properties = tag_properties(&branch.data),
                Tag::Statement(_) => parts.push(Part::Divider(
                    Element::new("ElseIf", tag_properties(&branch.data)).self_closing(),
                )),
                Tag::Fallthrough => parts.push(Part::Divider(Element::new("Else", Vec::new()).self_closing())),
                other => {
                    return Err(SchemaError::invariant(format!("<{}> is not a branch of <If>", other.name())).into())
                }
            }
            for child in &branch.children {
                parts.push(child_part(child)?);
            }
        }
        if let Some(id) = &node.extra.id {
            properties.push(Property::key("id", id.clone()));
        }
        Ok((Element::new("If", properties), parts))
    }
}
