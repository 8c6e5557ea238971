//! # Canonical form reader
//!
//! Reads the printer's output back into a typed tree so that printed text
//! can be checked against the tree it came from. It accepts exactly the
//! canonical syntax; it is not an authoring parser. Lexing lives in
//! [`crate::tokenizer`]; this module walks the token stream.
//!
//! Whitespace rules:
//! - outside fields and links, whitespace-only text is dropped
//! - inside them, a whitespace run containing a newline reads as a single
//!   space, or as nothing when it touches the start or end of the content
//! - other whitespace is kept verbatim

use crate::error::{ReadError, ReadResult};
use crate::printer::is_inline_container;
use crate::tokenizer::{tokenize, unescape_delimited, Spanned, Token};
use tracing::debug;
use wml_schema::{ComputedTag, ImageTag, Keyed, PronounsTag, StatementTag, Tag, TagNode, VariableTag, WmlTree};
use wml_tagtree::{NodeExtra, TreeNode, MAX_DEPTH};

/// Parse canonical WML text
pub fn parse(source: &str) -> ReadResult<WmlTree> {
    Reader::new(source)?.read()
}

/// Attribute values by name, delimiters already stripped
#[derive(Debug, Default)]
struct Attributes {
    named: Vec<(String, String)>,
    /// A bare `{expression}`, the condition of `<If>` and `<ElseIf>`
    bare: Option<String>,
}

impl Attributes {
    fn get(&self, name: &str) -> Option<String> {
        self.named
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value.clone())
    }

    fn required(&self, tag: &str, name: &str) -> ReadResult<String> {
        self.get(name)
            .ok_or_else(|| ReadError::missing_attribute(tag, name))
    }

    fn number(&self, tag: &str, name: &str) -> ReadResult<i64> {
        let value = self.required(tag, name)?;
        value.trim().parse().map_err(|_| ReadError::InvalidNumber {
            tag: tag.to_string(),
            value,
        })
    }

    fn keyed(&self, tag: &str) -> ReadResult<Keyed> {
        Ok(Keyed {
            key: self.required(tag, "key")?,
            from: self.get("from"),
        })
    }
}

/// An element whose closing tag has not been read yet
struct Frame {
    name: String,
    tag: Option<Tag>,
    extra: NodeExtra,
    inline: bool,
    children: Vec<TagNode>,
    /// Branches read so far, for `<If>` only
    branches: Option<Vec<TagNode>>,
    /// Nothing read since the opening tag or the last branch marker
    fresh: bool,
}

impl Frame {
    fn document() -> Self {
        Self {
            name: String::new(),
            tag: None,
            extra: NodeExtra::default(),
            inline: false,
            children: Vec::new(),
            branches: None,
            fresh: true,
        }
    }

    fn push(&mut self, node: TagNode, offset: usize) -> ReadResult<()> {
        self.fresh = false;
        match &mut self.branches {
            Some(branches) => branches
                .last_mut()
                .ok_or(ReadError::OrphanBranchContent { offset })?
                .children
                .push(node),
            None => self.children.push(node),
        }
        Ok(())
    }

    fn finish(self) -> Option<TagNode> {
        let tag = self.tag?;
        let children = self.branches.unwrap_or(self.children);
        Some(TreeNode::new(tag).with_extra(self.extra).with_children(children))
    }
}

struct Reader<'src> {
    tokens: Vec<Spanned<'src>>,
    pos: usize,
    end: usize,
}

impl<'src> Reader<'src> {
    fn new(source: &'src str) -> ReadResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            end: source.len(),
        })
    }

    fn peek(&self) -> Option<Token<'src>> {
        self.peek_ahead(0)
    }

    fn peek_ahead(&self, offset: usize) -> Option<Token<'src>> {
        self.tokens.get(self.pos + offset).map(|(token, _)| *token)
    }

    /// Byte offset of the next token, or the end of input
    fn peek_offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, span)| span.start)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, token: Token<'src>) -> bool {
        self.peek()
            .is_some_and(|next| std::mem::discriminant(&next) == std::mem::discriminant(&token))
    }

    fn expect(&mut self, token: Token<'src>) -> ReadResult<()> {
        if self.check(token) {
            self.advance();
            return Ok(());
        }
        Err(self.unexpected(&token.to_string()))
    }

    fn expect_name(&mut self) -> ReadResult<&'src str> {
        match self.peek() {
            Some(Token::Name(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("an element name")),
        }
    }

    fn unexpected(&self, expected: &str) -> ReadError {
        match self.peek() {
            Some(found) => ReadError::unexpected_token(self.peek_offset(), expected, found.to_string()),
            None => ReadError::UnexpectedEof,
        }
    }

    fn read(mut self) -> ReadResult<WmlTree> {
        let mut stack = vec![Frame::document()];
        loop {
            let offset = self.peek_offset();
            let raw = self.read_text();
            if !raw.is_empty() {
                let at_end = self.at_content_end(&stack);
                let frame = current(&mut stack)?;
                read_text_node(frame, &raw, offset, at_end)?;
            }
            match self.peek() {
                None => break,
                Some(Token::OpenClose) => self.read_close(&mut stack)?,
                Some(Token::Open) => self.read_open(&mut stack)?,
                Some(_) => return Err(self.unexpected("'<' or '</'")),
            }
        }

        let document = match stack.pop() {
            Some(frame) if stack.is_empty() => frame,
            Some(frame) => return Err(ReadError::Unclosed { name: frame.name }),
            None => return Err(ReadError::UnexpectedEof),
        };
        debug!(roots = document.children.len(), tokens = self.tokens.len(), "read canonical text");
        Ok(document.children)
    }

    /// Text up to the next tag, as (char, escaped) pairs
    fn read_text(&mut self) -> Vec<(char, bool)> {
        let mut raw = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Word(text) | Token::Whitespace(text) => raw.extend(text.chars().map(|ch| (ch, false))),
                Token::Escape(ch) => raw.push((ch, true)),
                _ => break,
            }
            self.advance();
        }
        raw
    }

    /// Whether the upcoming markup ends the current content run: end of
    /// input, a closing tag, or a branch marker of the enclosing `<If>`
    fn at_content_end(&self, stack: &[Frame]) -> bool {
        match self.peek() {
            None | Some(Token::OpenClose) => true,
            Some(Token::Open) => {
                let in_conditional = stack.last().is_some_and(|frame| frame.branches.is_some());
                in_conditional && matches!(self.peek_ahead(1), Some(Token::Name("ElseIf" | "Else")))
            }
            Some(_) => false,
        }
    }

    /// Attributes up to `>` or `/>`; returns whether the tag self-closes
    fn read_attributes(&mut self) -> ReadResult<(Attributes, bool)> {
        let mut attributes = Attributes::default();
        loop {
            match self.peek().ok_or(ReadError::UnexpectedEof)? {
                Token::End => {
                    self.advance();
                    return Ok((attributes, false));
                }
                Token::SelfClose => {
                    self.advance();
                    return Ok((attributes, true));
                }
                Token::Expression(expression) => {
                    self.advance();
                    attributes.bare = Some(expression.to_string());
                }
                Token::Name(name) => {
                    self.advance();
                    self.expect(Token::Equals)?;
                    let value = self.read_value()?;
                    attributes.named.push((name.to_string(), value));
                }
                _ => return Err(self.unexpected("an attribute, '>' or '/>'")),
            }
        }
    }

    fn read_value(&mut self) -> ReadResult<String> {
        let value = match self.peek() {
            Some(Token::Key(raw) | Token::Literal(raw)) => unescape_delimited(raw),
            Some(Token::Expression(expression)) => expression.to_string(),
            _ => return Err(self.unexpected("an attribute value")),
        };
        self.advance();
        Ok(value)
    }

    fn read_open(&mut self, stack: &mut Vec<Frame>) -> ReadResult<()> {
        let offset = self.peek_offset();
        self.expect(Token::Open)?;
        let name = self.expect_name()?.to_string();
        let (attributes, self_closing) = self.read_attributes()?;

        if matches!(name.as_str(), "ElseIf" | "Else") {
            let frame = current(stack)?;
            let Some(branches) = frame.branches.as_mut().filter(|_| self_closing) else {
                return Err(ReadError::StrayBranchMarker { name, offset });
            };
            let branch = match attributes.bare {
                Some(condition) if name == "ElseIf" => Tag::Statement(StatementTag::new(condition)),
                None if name == "ElseIf" => return Err(ReadError::missing_attribute("ElseIf", "condition")),
                _ => Tag::Fallthrough,
            };
            branches.push(TreeNode::new(branch));
            frame.fresh = true;
            return Ok(());
        }

        let tag = build_tag(&name, &attributes, offset)?;
        let extra = NodeExtra {
            id: attributes.get("id"),
            inherited: false,
        };
        let parent = current(stack)?;
        let inline = match &tag {
            tag if is_inline_container(tag) => true,
            Tag::If | Tag::Remove | Tag::Replace | Tag::ReplaceMatch | Tag::ReplacePayload => parent.inline,
            _ => false,
        };
        let branches = matches!(tag, Tag::If).then(|| {
            attributes
                .bare
                .map(|condition| vec![TreeNode::new(Tag::Statement(StatementTag::new(condition)))])
                .unwrap_or_default()
        });
        let frame = Frame {
            name,
            tag: Some(tag),
            extra,
            inline,
            children: Vec::new(),
            branches,
            fresh: true,
        };

        if self_closing {
            if let Some(node) = frame.finish() {
                parent.push(node, offset)?;
            }
            return Ok(());
        }
        if stack.len() > MAX_DEPTH {
            return Err(ReadError::MaxNestingDepthExceeded { max_depth: MAX_DEPTH });
        }
        stack.push(frame);
        Ok(())
    }

    fn read_close(&mut self, stack: &mut Vec<Frame>) -> ReadResult<()> {
        let offset = self.peek_offset();
        self.expect(Token::OpenClose)?;
        let name = self.expect_name()?.to_string();
        self.expect(Token::End)?;

        if stack.len() < 2 {
            return Err(ReadError::MismatchedClose {
                expected: String::new(),
                found: name,
            });
        }
        let frame = stack.pop().ok_or(ReadError::UnexpectedEof)?;
        if frame.name != name {
            return Err(ReadError::MismatchedClose {
                expected: frame.name,
                found: name,
            });
        }
        if let Some(node) = frame.finish() {
            current(stack)?.push(node, offset)?;
        }
        Ok(())
    }
}

fn current(stack: &mut [Frame]) -> ReadResult<&mut Frame> {
    stack.last_mut().ok_or(ReadError::UnexpectedEof)
}

fn read_text_node(frame: &mut Frame, raw: &[(char, bool)], offset: usize, at_end: bool) -> ReadResult<()> {
    if !frame.inline {
        if raw.iter().all(|(ch, escaped)| !escaped && ch.is_whitespace()) {
            return Ok(());
        }
        return Err(ReadError::UnexpectedText { offset });
    }

    let value = normalize_whitespace(raw, frame.fresh, at_end);
    if value.is_empty() {
        return Ok(());
    }
    frame.push(TreeNode::new(Tag::text(value)), offset)
}

/// Apply the inline whitespace rules to one run of text
fn normalize_whitespace(raw: &[(char, bool)], at_start: bool, at_end: bool) -> String {
    let is_space = |(ch, escaped): &(char, bool)| !escaped && ch.is_whitespace();
    let mut value = String::new();
    let mut index = 0;
    while index < raw.len() {
        if !is_space(&raw[index]) {
            value.push(raw[index].0);
            index += 1;
            continue;
        }
        let start = index;
        while index < raw.len() && is_space(&raw[index]) {
            index += 1;
        }
        let run = &raw[start..index];
        if !run.iter().any(|(ch, _)| *ch == '\n') {
            value.extend(run.iter().map(|(ch, _)| *ch));
        } else if !((start == 0 && at_start) || (index == raw.len() && at_end)) {
            value.push(' ');
        }
    }
    value
}

fn build_tag(name: &str, attributes: &Attributes, offset: usize) -> ReadResult<Tag> {
    let tag = match name {
        "Asset" => Tag::Asset {
            key: attributes.required(name, "key")?,
        },
        "Room" => Tag::Room(attributes.keyed(name)?),
        "Feature" => Tag::Feature(attributes.keyed(name)?),
        "Knowledge" => Tag::Knowledge(attributes.keyed(name)?),
        "Bookmark" => Tag::Bookmark(attributes.keyed(name)?),
        "Map" => Tag::Map(attributes.keyed(name)?),
        "Theme" => Tag::Theme(attributes.keyed(name)?),
        "Message" => Tag::Message(attributes.keyed(name)?),
        "Moment" => Tag::Moment(attributes.keyed(name)?),
        "Action" => Tag::Action(attributes.keyed(name)?),
        "Character" => Tag::Character(attributes.keyed(name)?),
        "Variable" => Tag::Variable(VariableTag {
            key: attributes.required(name, "key")?,
            from: attributes.get("from"),
            default: attributes.get("default"),
        }),
        "Computed" => Tag::Computed(ComputedTag {
            key: attributes.required(name, "key")?,
            from: attributes.get("from"),
            src: attributes.get("src").unwrap_or_default(),
            dependencies: Vec::new(),
        }),
        "Image" => Tag::Image(ImageTag {
            key: attributes.required(name, "key")?,
            from: attributes.get("from"),
            url: attributes.get("url"),
        }),
        "Exit" => Tag::Exit {
            key: attributes.required(name, "key")?,
            to: attributes.required(name, "to")?,
        },
        "Position" => Tag::Position {
            room: attributes.required(name, "room")?,
            x: attributes.number(name, "x")?,
            y: attributes.number(name, "y")?,
        },
        "Pronouns" => {
            let fallback = PronounsTag::default();
            Tag::Pronouns(PronounsTag {
                subject: attributes.get("subject").unwrap_or(fallback.subject),
                object: attributes.get("object").unwrap_or(fallback.object),
                possessive: attributes.get("possessive").unwrap_or(fallback.possessive),
                adjective: attributes.get("adjective").unwrap_or(fallback.adjective),
                reflexive: attributes.get("reflexive").unwrap_or(fallback.reflexive),
            })
        }
        "Link" => Tag::Link {
            to: attributes.required(name, "to")?,
        },
        "br" => Tag::LineBreak,
        "Space" => Tag::Space,
        "Name" => Tag::Name,
        "ShortName" => Tag::ShortName,
        "Summary" => Tag::Summary,
        "Description" => Tag::Description,
        "If" => Tag::If,
        "Remove" => Tag::Remove,
        "Replace" => Tag::Replace,
        "ReplaceMatch" => Tag::ReplaceMatch,
        "ReplacePayload" => Tag::ReplacePayload,
        "Import" => Tag::Import {
            from: attributes.required(name, "from")?,
        },
        "Export" => Tag::Export,
        "Inherited" => Tag::Inherited,
        _ => {
            return Err(ReadError::UnknownElement {
                name: name.to_string(),
                offset,
            })
        }
    };
    Ok(tag)
}
