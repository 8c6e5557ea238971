use thiserror::Error;
use wml_tagtree::TagTreeError;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("<{child}> is not allowed inside <{parent}>")]
    DisallowedChild { parent: String, child: String },

    #[error("<{tag}> is missing required property '{property}'")]
    MissingProperty { tag: String, property: String },

    #[error("Key '{key}' is declared as both {first} and {second}")]
    KindConflict {
        key: String,
        first: String,
        second: String,
    },

    #[error("Invalid root <{tag}>: expected <Asset> or <Character>")]
    InvalidRoot { tag: String },

    #[error("Maximum nesting depth ({max_depth}) exceeded")]
    MaxNestingDepthExceeded { max_depth: usize },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Tag tree error: {0}")]
    TagTree(#[from] TagTreeError),
}

impl SchemaError {
    pub fn disallowed_child(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self::DisallowedChild {
            parent: parent.into(),
            child: child.into(),
        }
    }

    pub fn missing_property(tag: impl Into<String>, property: impl Into<String>) -> Self {
        Self::MissingProperty {
            tag: tag.into(),
            property: property.into(),
        }
    }

    pub fn kind_conflict(key: impl Into<String>, first: impl Into<String>, second: impl Into<String>) -> Self {
        Self::KindConflict {
            key: key.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}
