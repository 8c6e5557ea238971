use thiserror::Error;

pub type TagTreeResult<T> = Result<T, TagTreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TagTreeError {
    #[error("Wrapper node at depth {depth} has no children")]
    MalformedWrapper { depth: usize },

    #[error("Maximum tree depth ({max_depth}) exceeded")]
    DepthExceeded { max_depth: usize },
}

impl TagTreeError {
    pub fn malformed_wrapper(depth: usize) -> Self {
        Self::MalformedWrapper { depth }
    }

    pub fn depth_exceeded(max_depth: usize) -> Self {
        Self::DepthExceeded { max_depth }
    }
}
