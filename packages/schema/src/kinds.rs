use crate::tag::Tag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds in their fixed global order. Standard forms list
/// components kind by kind in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Variable,
    Computed,
    Character,
    Room,
    Feature,
    Knowledge,
    Map,
    Image,
    Theme,
    Bookmark,
    Message,
    Moment,
    Action,
}

impl EntityKind {
    pub const ORDER: [EntityKind; 13] = [
        EntityKind::Variable,
        EntityKind::Computed,
        EntityKind::Character,
        EntityKind::Room,
        EntityKind::Feature,
        EntityKind::Knowledge,
        EntityKind::Map,
        EntityKind::Image,
        EntityKind::Theme,
        EntityKind::Bookmark,
        EntityKind::Message,
        EntityKind::Moment,
        EntityKind::Action,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Variable => "Variable",
            EntityKind::Computed => "Computed",
            EntityKind::Character => "Character",
            EntityKind::Room => "Room",
            EntityKind::Feature => "Feature",
            EntityKind::Knowledge => "Knowledge",
            EntityKind::Map => "Map",
            EntityKind::Image => "Image",
            EntityKind::Theme => "Theme",
            EntityKind::Bookmark => "Bookmark",
            EntityKind::Message => "Message",
            EntityKind::Moment => "Moment",
            EntityKind::Action => "Action",
        }
    }

    /// Named fields in declared order
    pub fn fields(self) -> &'static [FieldKind] {
        use FieldKind::*;
        match self {
            EntityKind::Room => &[ShortName, Name, Summary, Description],
            EntityKind::Character => &[Name, ShortName, Summary, Description],
            EntityKind::Feature | EntityKind::Bookmark | EntityKind::Moment | EntityKind::Action => {
                &[Name, Description]
            }
            EntityKind::Knowledge => &[Name, Summary, Description],
            EntityKind::Map | EntityKind::Theme => &[Name],
            EntityKind::Message => &[Description],
            EntityKind::Variable | EntityKind::Computed | EntityKind::Image => &[],
        }
    }

    /// List-valued children in declared order
    pub fn lists(self) -> &'static [ListKind] {
        match self {
            EntityKind::Room => &[ListKind::Exits],
            EntityKind::Map => &[ListKind::Positions],
            EntityKind::Character => &[ListKind::Pronouns],
            _ => &[],
        }
    }

    pub fn has_field(self, field: FieldKind) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Name,
    ShortName,
    Summary,
    Description,
}

impl FieldKind {
    pub fn of(tag: &Tag) -> Option<FieldKind> {
        match tag {
            Tag::Name => Some(FieldKind::Name),
            Tag::ShortName => Some(FieldKind::ShortName),
            Tag::Summary => Some(FieldKind::Summary),
            Tag::Description => Some(FieldKind::Description),
            _ => None,
        }
    }

    /// Root tag of the field subtree
    pub fn tag(self) -> Tag {
        match self {
            FieldKind::Name => Tag::Name,
            FieldKind::ShortName => Tag::ShortName,
            FieldKind::Summary => Tag::Summary,
            FieldKind::Description => Tag::Description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ListKind {
    Exits,
    Positions,
    Pronouns,
}

impl ListKind {
    pub fn of(tag: &Tag) -> Option<ListKind> {
        match tag {
            Tag::Exit { .. } => Some(ListKind::Exits),
            Tag::Position { .. } => Some(ListKind::Positions),
            Tag::Pronouns(_) => Some(ListKind::Pronouns),
            _ => None,
        }
    }
}

/// Category label handed to the tag-tree engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagCategory {
    Container,
    Entity,
    ListItem,
    Field,
    Inline,
    Conditional,
    Branch,
    Edit,
    EditBranch,
    Import,
    Export,
    Inherited,
}

pub fn classify(tag: &Tag) -> TagCategory {
    match tag {
        Tag::Asset { .. } => TagCategory::Container,
        Tag::Room(_)
        | Tag::Feature(_)
        | Tag::Knowledge(_)
        | Tag::Bookmark(_)
        | Tag::Map(_)
        | Tag::Theme(_)
        | Tag::Message(_)
        | Tag::Moment(_)
        | Tag::Variable(_)
        | Tag::Computed(_)
        | Tag::Action(_)
        | Tag::Image(_)
        | Tag::Character(_) => TagCategory::Entity,
        Tag::Exit { .. } | Tag::Position { .. } | Tag::Pronouns(_) => TagCategory::ListItem,
        Tag::Name | Tag::ShortName | Tag::Summary | Tag::Description => TagCategory::Field,
        Tag::Text { .. } | Tag::Link { .. } | Tag::LineBreak | Tag::Space => TagCategory::Inline,
        Tag::If => TagCategory::Conditional,
        Tag::Statement(_) | Tag::Fallthrough => TagCategory::Branch,
        Tag::Remove | Tag::Replace => TagCategory::Edit,
        Tag::ReplaceMatch | Tag::ReplacePayload => TagCategory::EditBranch,
        Tag::Import { .. } => TagCategory::Import,
        Tag::Export => TagCategory::Export,
        Tag::Inherited => TagCategory::Inherited,
    }
}
