//! Collaborators behind the editor session
//!
//! The session never talks to a server directly. Project storage, the
//! dataset catalog and the training simulator are trait objects so a host
//! can swap the HTTP implementations for local files or test doubles.

pub mod file;
pub mod genai;
pub mod http;

use async_trait::async_trait;
use flow_engine::{DatasetRecord, ProjectSnapshot};

use crate::error::Result;

pub use file::FileProjectStore;
pub use genai::GenAiClient;
pub use http::HttpApiClient;

/// Whole-document project persistence
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Raw saved content, or `None` when the project has none yet
    async fn load_project(&self, project_id: &str) -> Result<Option<String>>;

    /// Overwrite the project's content with a snapshot
    async fn save_project(&self, project_id: &str, snapshot: &ProjectSnapshot) -> Result<()>;
}

/// Catalog of datasets visible to a student
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Public datasets plus those the student owns
    async fn list_datasets(&self, student_id: &str) -> Result<Vec<DatasetRecord>>;
}

/// Text generation used by the training simulator
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generated text; may be empty
    async fn generate(&self, prompt: &str) -> Result<String>;
}
