use crate::form::{ImportOrigin, StandardComponent, StandardField};
use serde::{Deserialize, Serialize};
use wml_schema::{EntityKind, Tag, TagNode};

/// Flat record of one addressable component, ready for an external store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardRecord {
    pub kind: EntityKind,
    pub key: String,
    pub tag: Tag,
    pub fields: Vec<StandardField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TagNode>,
    /// Source asset and original key, for imported components
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ImportOrigin>,
}

impl From<&StandardComponent> for StandardRecord {
    fn from(component: &StandardComponent) -> Self {
        Self {
            kind: component.kind,
            key: component.key.clone(),
            tag: component.tag.clone(),
            fields: component.fields.clone(),
            items: component.items.clone(),
            from: component.from.clone(),
        }
    }
}
