use crate::graph::ConnectError;
use crate::id::ObjectId;
use thiserror::Error;

/// Errors surfaced by editor operations.
///
/// Everything here is recoverable: the canvas state is left unchanged when
/// an operation returns `Err`.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("object {0} not found")]
    NotFound(ObjectId),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("cannot link ports: {0}")]
    Connect(#[from] ConnectError),

    #[error("script rejected: {0}")]
    UnsafeScript(String),

    #[error("node {node} failed validation: {message}")]
    Validation { node: ObjectId, message: String },

    #[error("clipboard: {0}")]
    Clipboard(String),

    #[error("failed to decode image {src}")]
    Decode { src: String },

    #[error("invalid document: {0}")]
    Json(#[from] serde_json::Error),
}

impl std::error::Error for ConnectError {}

pub type EditorResult<T> = Result<T, EditorError>;
