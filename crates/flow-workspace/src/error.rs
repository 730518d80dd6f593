//! Error types for the workspace layer

use flow_engine::FlowError;
use thiserror::Error;

/// Result type alias using WorkspaceError
pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Engine(#[from] FlowError),

    /// The server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The text generator answered without any candidate text
    #[error("Generation error: {0}")]
    Generation(String),

    /// A project id that cannot name a stored project
    #[error("Invalid project id: '{0}'")]
    InvalidProjectId(String),
}
