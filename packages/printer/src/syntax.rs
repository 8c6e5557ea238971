//! Lexical pieces of the canonical textual form: element names,
//! properties and escaping.

use wml_schema::{Tag, TagNode};

/// How a property value is delimited
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// `(key)`
    Key(String),
    /// `"literal"`
    Literal(String),
    /// `{expression}`
    Expression(String),
}

impl PropertyValue {
    pub fn render(&self) -> String {
        match self {
            PropertyValue::Key(key) => format!("({})", escape_key(key)),
            PropertyValue::Literal(value) => format!("\"{}\"", escape_literal(value)),
            PropertyValue::Expression(source) => format!("{{{source}}}"),
        }
    }
}

/// One property of an opening tag; unnamed properties are bare
/// expressions such as the condition of `<If {…}>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: Option<&'static str>,
    pub value: PropertyValue,
}

impl Property {
    pub fn key(name: &'static str, key: impl Into<String>) -> Self {
        Self {
            name: Some(name),
            value: PropertyValue::Key(key.into()),
        }
    }

    pub fn literal(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name: Some(name),
            value: PropertyValue::Literal(value.into()),
        }
    }

    pub fn expression(name: &'static str, source: impl Into<String>) -> Self {
        Self {
            name: Some(name),
            value: PropertyValue::Expression(source.into()),
        }
    }

    pub fn condition(source: impl Into<String>) -> Self {
        Self {
            name: None,
            value: PropertyValue::Expression(source.into()),
        }
    }

    pub fn render(&self) -> String {
        match self.name {
            Some(name) => format!("{name}={}", self.value.render()),
            None => self.value.render(),
        }
    }
}

/// Element name and properties of an opening tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: &'static str,
    pub properties: Vec<Property>,
}

impl Element {
    pub fn new(name: &'static str, properties: Vec<Property>) -> Self {
        Self { name, properties }
    }

    /// Element for a node: its tag's own properties followed by its id
    pub fn of(node: &TagNode) -> Self {
        let mut properties = tag_properties(&node.data);
        if let Some(id) = &node.extra.id {
            properties.push(Property::key("id", id.clone()));
        }
        Self::new(node.data.name(), properties)
    }

    fn properties_inline(&self) -> String {
        self.properties
            .iter()
            .map(|property| format!(" {}", property.render()))
            .collect()
    }

    fn properties_block(&self, indent: &str) -> String {
        self.properties
            .iter()
            .map(|property| format!("\n{indent}{}", property.render()))
            .collect()
    }

    pub fn open(&self) -> String {
        format!("<{}{}>", self.name, self.properties_inline())
    }

    pub fn self_closing(&self) -> String {
        format!("<{}{} />", self.name, self.properties_inline())
    }

    pub fn open_block(&self, indent: &str) -> String {
        format!("<{}{}\n>", self.name, self.properties_block(indent))
    }

    pub fn self_closing_block(&self, indent: &str) -> String {
        format!("<{}{}\n/>", self.name, self.properties_block(indent))
    }

    pub fn close(&self) -> String {
        format!("</{}>", self.name)
    }
}

fn keyed(key: &str, from: Option<&String>) -> Vec<Property> {
    let mut properties = vec![Property::key("key", key)];
    if let Some(from) = from {
        properties.push(Property::key("from", from.clone()));
    }
    properties
}

/// Properties carried by a tag, in printing order
pub fn tag_properties(tag: &Tag) -> Vec<Property> {
    match tag {
        Tag::Asset { key } => vec![Property::key("key", key.clone())],
        Tag::Room(k)
        | Tag::Feature(k)
        | Tag::Knowledge(k)
        | Tag::Bookmark(k)
        | Tag::Map(k)
        | Tag::Theme(k)
        | Tag::Message(k)
        | Tag::Moment(k)
        | Tag::Action(k)
        | Tag::Character(k) => keyed(&k.key, k.from.as_ref()),
        Tag::Variable(variable) => {
            let mut properties = keyed(&variable.key, variable.from.as_ref());
            if let Some(default) = &variable.default {
                properties.push(Property::expression("default", default.clone()));
            }
            properties
        }
        Tag::Computed(computed) => {
            let mut properties = keyed(&computed.key, computed.from.as_ref());
            properties.push(Property::expression("src", computed.src.clone()));
            properties
        }
        Tag::Image(image) => {
            let mut properties = keyed(&image.key, image.from.as_ref());
            if let Some(url) = &image.url {
                properties.push(Property::literal("url", url.clone()));
            }
            properties
        }
        Tag::Exit { key, to } => vec![Property::key("key", key.clone()), Property::key("to", to.clone())],
        Tag::Position { room, x, y } => vec![
            Property::key("room", room.clone()),
            Property::expression("x", x.to_string()),
            Property::expression("y", y.to_string()),
        ],
        Tag::Pronouns(pronouns) => vec![
            Property::literal("subject", pronouns.subject.clone()),
            Property::literal("object", pronouns.object.clone()),
            Property::literal("possessive", pronouns.possessive.clone()),
            Property::literal("adjective", pronouns.adjective.clone()),
            Property::literal("reflexive", pronouns.reflexive.clone()),
        ],
        Tag::Link { to } => vec![Property::key("to", to.clone())],
        Tag::Import { from } => vec![Property::key("from", from.clone())],
        Tag::Statement(statement) => vec![Property::condition(statement.condition.clone())],
        _ => Vec::new(),
    }
}

pub fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '<' => escaped.push_str("\\<"),
            '>' => escaped.push_str("\\>"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for ch in key.chars() {
        if matches!(ch, '\\' | ')') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
