use thiserror::Error;
use wml_schema::SchemaError;

pub type PrintResult<T> = Result<T, PrintError>;
pub type ReadResult<T> = Result<T, ReadError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PrintError {
    #[error("Invariant violation: no layout candidates for {context}")]
    EmptyCandidates { context: String },

    #[error("Maximum nesting depth ({max_depth}) exceeded")]
    MaxNestingDepthExceeded { max_depth: usize },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PrintError {
    pub fn empty_candidates(context: impl Into<String>) -> Self {
        Self::EmptyCandidates {
            context: context.into(),
        }
    }
}

/// Failures reading the canonical textual form back into a tree
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Unexpected '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("Expected {expected} but found {found} at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("Unknown element <{name}> at offset {offset}")]
    UnknownElement { name: String, offset: usize },

    #[error("Expected </{expected}> but found </{found}>")]
    MismatchedClose { expected: String, found: String },

    #[error("<{tag}> is missing attribute '{attribute}'")]
    MissingAttribute { tag: String, attribute: String },

    #[error("Invalid number '{value}' in <{tag}>")]
    InvalidNumber { tag: String, value: String },

    #[error("Text is not allowed at offset {offset}")]
    UnexpectedText { offset: usize },

    #[error("Content before the first branch of <If> at offset {offset}")]
    OrphanBranchContent { offset: usize },

    #[error("<{name}> outside of <If> at offset {offset}")]
    StrayBranchMarker { name: String, offset: usize },

    #[error("Unclosed <{name}>")]
    Unclosed { name: String },

    #[error("Maximum nesting depth ({max_depth}) exceeded")]
    MaxNestingDepthExceeded { max_depth: usize },
}

impl ReadError {
    pub fn unexpected_token(offset: usize, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            offset,
        }
    }

    pub fn missing_attribute(tag: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            tag: tag.into(),
            attribute: attribute.into(),
        }
    }
}
