//! Flow Workspace - async boundary of the Flow Lab pipeline editor
//!
//! Wraps the synchronous `flow-engine` core in an [`EditorSession`] and
//! connects it to the outside world:
//!
//! - [`ProjectStore`]: load and save a project as one JSON document
//!   ([`HttpApiClient`] or [`FileProjectStore`])
//! - [`DatasetSource`]: the student's dataset catalog ([`HttpApiClient`])
//! - [`TextGenerator`]: the training simulator ([`GenAiClient`])
//!
//! # Example
//!
//! ```ignore
//! let config = WorkspaceConfig::from_env();
//! let api = Arc::new(HttpApiClient::from_config(&config));
//! let backends = Collaborators {
//!     projects: api.clone(),
//!     datasets: api,
//!     generator: Arc::new(GenAiClient::from_config(&config)),
//! };
//!
//! let mut session = EditorSession::new("1712345678901", &config, backends);
//! session.open().await?;
//! session.refresh_catalog("student-1").await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod session;

pub use backend::{DatasetSource, FileProjectStore, GenAiClient, HttpApiClient, ProjectStore, TextGenerator};
pub use config::WorkspaceConfig;
pub use error::{Result, WorkspaceError};
pub use session::{Collaborators, EditorSession};
