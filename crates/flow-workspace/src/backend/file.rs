//! Projects stored as JSON files in a local directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use flow_engine::ProjectSnapshot;
use tokio::fs;

use super::ProjectStore;
use crate::error::{Result, WorkspaceError};

/// One `{project_id}.json` file per project
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ids become file names, so only `[A-Za-z0-9_-]` is accepted
    fn path_for(&self, project_id: &str) -> Result<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(WorkspaceError::InvalidProjectId(project_id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", project_id)))
    }
}

#[async_trait]
impl ProjectStore for FileProjectStore {
    async fn load_project(&self, project_id: &str) -> Result<Option<String>> {
        let path = self.path_for(project_id)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No saved project at '{}'", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_project(&self, project_id: &str, snapshot: &ProjectSnapshot) -> Result<()> {
        let path = self.path_for(project_id)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, snapshot.to_json()?).await?;
        log::debug!("Wrote project to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_project_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::new(dir.path());
        assert!(store.load_project("1712").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::new(dir.path().join("projects"));
        let snapshot = ProjectSnapshot {
            log: "Epoch 1".to_string(),
            ..ProjectSnapshot::default()
        };

        store.save_project("lab-01", &snapshot).await.unwrap();
        let content = store.load_project("lab-01").await.unwrap().unwrap();
        assert_eq!(ProjectSnapshot::from_json(&content).unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::new(dir.path());
        for id in ["", "../escape", "a/b", "x.json"] {
            assert!(matches!(
                store.load_project(id).await,
                Err(WorkspaceError::InvalidProjectId(_))
            ));
        }
    }
}
