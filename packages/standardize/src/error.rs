use thiserror::Error;
use wml_schema::SchemaError;
use wml_tagtree::TagTreeError;

pub type StandardizeResult<T> = Result<T, StandardizeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StandardizeError {
    /// An edit's target does not line up with the content it follows.
    /// The edit has to be re-authored against the current content.
    #[error("Merge conflict: edit '{edit}' does not align with '{base}'")]
    MergeConflict { base: String, edit: String },

    #[error("Malformed edit: {0}")]
    MalformedEdit(String),

    #[error("No input documents")]
    EmptyInput,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    TagTree(#[from] TagTreeError),
}

impl StandardizeError {
    pub fn merge_conflict(base: impl Into<String>, edit: impl Into<String>) -> Self {
        Self::MergeConflict {
            base: base.into(),
            edit: edit.into(),
        }
    }

    pub fn malformed_edit(message: impl Into<String>) -> Self {
        Self::MalformedEdit(message.into())
    }
}
