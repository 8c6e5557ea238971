use crate::kinds::EntityKind;
use serde::{Deserialize, Serialize};
use wml_tagtree::{Tree, TreeNode};

/// A typed WML tree
pub type WmlTree = Tree<Tag>;
pub type TagNode = TreeNode<Tag>;

/// Key plus optional import origin, shared by most entity tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyed {
    pub key: String,
    /// Original key in the source asset, set on entries inside `<Import>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl Keyed {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            from: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableTag {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedTag {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTag {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronounsTag {
    pub subject: String,
    pub object: String,
    pub possessive: String,
    pub adjective: String,
    pub reflexive: String,
}

impl Default for PronounsTag {
    fn default() -> Self {
        Self {
            subject: "they".to_string(),
            object: "them".to_string(),
            possessive: "theirs".to_string(),
            adjective: "their".to_string(),
            reflexive: "themself".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementTag {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl StatementTag {
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            dependencies: Vec::new(),
        }
    }
}

/// The closed WML node vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Tag {
    // Top-level container of a generic asset
    Asset { key: String },

    // Entities
    Room(Keyed),
    Feature(Keyed),
    Knowledge(Keyed),
    Bookmark(Keyed),
    Map(Keyed),
    Theme(Keyed),
    Message(Keyed),
    Moment(Keyed),
    Variable(VariableTag),
    Computed(ComputedTag),
    Action(Keyed),
    Image(ImageTag),
    Character(Keyed),

    // List items
    Exit { key: String, to: String },
    Position { room: String, x: i64, y: i64 },
    Pronouns(PronounsTag),

    // Inline output
    #[serde(rename = "String")]
    Text { value: String },
    Link { to: String },
    LineBreak,
    Space,

    // Named fields
    Name,
    ShortName,
    Summary,
    Description,

    // Conditionals
    If,
    Statement(StatementTag),
    Fallthrough,

    // Edits
    Remove,
    Replace,
    ReplaceMatch,
    ReplacePayload,

    // Structure
    Import { from: String },
    Export,
    Inherited,
}

/// Borrowed view of an entity tag's identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityRef<'a> {
    pub kind: EntityKind,
    pub key: &'a str,
    pub from: Option<&'a str>,
}

impl Tag {
    pub fn text(value: impl Into<String>) -> Self {
        Tag::Text {
            value: value.into(),
        }
    }

    pub fn statement(condition: impl Into<String>) -> Self {
        Tag::Statement(StatementTag::new(condition))
    }

    pub fn room(key: impl Into<String>) -> Self {
        Tag::Room(Keyed::new(key))
    }

    pub fn feature(key: impl Into<String>) -> Self {
        Tag::Feature(Keyed::new(key))
    }

    pub fn character(key: impl Into<String>) -> Self {
        Tag::Character(Keyed::new(key))
    }

    pub fn asset(key: impl Into<String>) -> Self {
        Tag::Asset { key: key.into() }
    }

    /// Entity tag for `kind` with just a key
    pub fn entity(kind: EntityKind, key: impl Into<String>) -> Self {
        let key = key.into();
        match kind {
            EntityKind::Room => Tag::Room(Keyed::new(key)),
            EntityKind::Feature => Tag::Feature(Keyed::new(key)),
            EntityKind::Knowledge => Tag::Knowledge(Keyed::new(key)),
            EntityKind::Bookmark => Tag::Bookmark(Keyed::new(key)),
            EntityKind::Map => Tag::Map(Keyed::new(key)),
            EntityKind::Theme => Tag::Theme(Keyed::new(key)),
            EntityKind::Message => Tag::Message(Keyed::new(key)),
            EntityKind::Moment => Tag::Moment(Keyed::new(key)),
            EntityKind::Action => Tag::Action(Keyed::new(key)),
            EntityKind::Character => Tag::Character(Keyed::new(key)),
            EntityKind::Variable => Tag::Variable(VariableTag {
                key,
                from: None,
                default: None,
            }),
            EntityKind::Computed => Tag::Computed(ComputedTag {
                key,
                from: None,
                src: String::new(),
                dependencies: Vec::new(),
            }),
            EntityKind::Image => Tag::Image(ImageTag {
                key,
                from: None,
                url: None,
            }),
        }
    }

    /// Element name used in diagnostics and in the textual form
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Asset { .. } => "Asset",
            Tag::Room(_) => "Room",
            Tag::Feature(_) => "Feature",
            Tag::Knowledge(_) => "Knowledge",
            Tag::Bookmark(_) => "Bookmark",
            Tag::Map(_) => "Map",
            Tag::Theme(_) => "Theme",
            Tag::Message(_) => "Message",
            Tag::Moment(_) => "Moment",
            Tag::Variable(_) => "Variable",
            Tag::Computed(_) => "Computed",
            Tag::Action(_) => "Action",
            Tag::Image(_) => "Image",
            Tag::Character(_) => "Character",
            Tag::Exit { .. } => "Exit",
            Tag::Position { .. } => "Position",
            Tag::Pronouns(_) => "Pronouns",
            Tag::Text { .. } => "String",
            Tag::Link { .. } => "Link",
            Tag::LineBreak => "br",
            Tag::Space => "Space",
            Tag::Name => "Name",
            Tag::ShortName => "ShortName",
            Tag::Summary => "Summary",
            Tag::Description => "Description",
            Tag::If => "If",
            Tag::Statement(_) => "Statement",
            Tag::Fallthrough => "Else",
            Tag::Remove => "Remove",
            Tag::Replace => "Replace",
            Tag::ReplaceMatch => "ReplaceMatch",
            Tag::ReplacePayload => "ReplacePayload",
            Tag::Import { .. } => "Import",
            Tag::Export => "Export",
            Tag::Inherited => "Inherited",
        }
    }

    /// Identity of an entity tag
    pub fn as_entity(&self) -> Option<EntityRef<'_>> {
        let (kind, key, from) = match self {
            Tag::Room(k) => (EntityKind::Room, &k.key, &k.from),
            Tag::Feature(k) => (EntityKind::Feature, &k.key, &k.from),
            Tag::Knowledge(k) => (EntityKind::Knowledge, &k.key, &k.from),
            Tag::Bookmark(k) => (EntityKind::Bookmark, &k.key, &k.from),
            Tag::Map(k) => (EntityKind::Map, &k.key, &k.from),
            Tag::Theme(k) => (EntityKind::Theme, &k.key, &k.from),
            Tag::Message(k) => (EntityKind::Message, &k.key, &k.from),
            Tag::Moment(k) => (EntityKind::Moment, &k.key, &k.from),
            Tag::Action(k) => (EntityKind::Action, &k.key, &k.from),
            Tag::Character(k) => (EntityKind::Character, &k.key, &k.from),
            Tag::Variable(v) => (EntityKind::Variable, &v.key, &v.from),
            Tag::Computed(c) => (EntityKind::Computed, &c.key, &c.from),
            Tag::Image(i) => (EntityKind::Image, &i.key, &i.from),
            _ => return None,
        };
        Some(EntityRef {
            kind,
            key,
            from: from.as_deref(),
        })
    }

    pub fn is_entity_of(&self, kind: EntityKind, key: &str) -> bool {
        self.as_entity()
            .is_some_and(|entity| entity.kind == kind && entity.key == key)
    }

    /// Copy of an entity tag with its import origin cleared
    pub fn without_from(&self) -> Tag {
        let mut tag = self.clone();
        match &mut tag {
            Tag::Room(k)
            | Tag::Feature(k)
            | Tag::Knowledge(k)
            | Tag::Bookmark(k)
            | Tag::Map(k)
            | Tag::Theme(k)
            | Tag::Message(k)
            | Tag::Moment(k)
            | Tag::Action(k)
            | Tag::Character(k) => k.from = None,
            Tag::Variable(v) => v.from = None,
            Tag::Computed(c) => c.from = None,
            Tag::Image(i) => i.from = None,
            _ => {}
        }
        tag
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Tag::Text { .. })
    }

    pub fn text_value(&self) -> Option<&str> {
        match self {
            Tag::Text { value } => Some(value),
            _ => None,
        }
    }

    /// Root tags of a document
    pub fn is_container(&self) -> bool {
        matches!(self, Tag::Asset { .. } | Tag::Character(_))
    }
}

/// Shorthand for building typed trees in code and tests
pub fn node(tag: Tag, children: Vec<TagNode>) -> TagNode {
    TreeNode::new(tag).with_children(children)
}

pub fn text(value: &str) -> TagNode {
    TreeNode::new(Tag::text(value))
}
