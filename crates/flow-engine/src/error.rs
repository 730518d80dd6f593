//! Error types for the flow engine
//!
//! Interactive operations (store mutations, gestures, upstream resolution)
//! never return these: a rejected gesture is a no-op and a failed resolution
//! is `None`. `FlowError` only crosses codec boundaries such as snapshot
//! parsing, undo compression and simulation prompt building.

use thiserror::Error;

/// Result type alias using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur at the engine's codec boundaries
#[derive(Debug, Error)]
pub enum FlowError {
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),

    /// A simulation was requested for a graph without nodes
    #[error("Pipeline has no nodes")]
    EmptyPipeline,

    /// Undo snapshot index out of range
    #[error("Snapshot {0} is not available")]
    MissingSnapshot(usize),
}

impl FlowError {
    /// Create a compression error from any displayable source
    pub fn compression(err: impl std::fmt::Display) -> Self {
        Self::Compression(err.to_string())
    }
}
