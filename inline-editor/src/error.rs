use shared_types::InvalidPath;

use crate::document::DocumentError;

/// Errors raised by the editor itself. Remote failures are not errors at this
/// level; they travel as [`crate::client::RemoteError`] outcomes.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Invalid attribute path: {0}")]
    InvalidPath(#[from] InvalidPath),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
