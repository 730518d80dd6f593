//! Project and dataset API over HTTP

use async_trait::async_trait;
use flow_engine::{DatasetRecord, ProjectSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DatasetSource, ProjectStore};
use crate::config::WorkspaceConfig;
use crate::error::{Result, WorkspaceError};

/// Client for the lab server's REST API
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

/// A project row; only the content matters to the editor
#[derive(Deserialize)]
struct ProjectRow {
    #[serde(default)]
    content: Option<Value>,
}

#[derive(Serialize)]
struct SaveRequest<'a> {
    content: &'a ProjectSnapshot,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.api_base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into `WorkspaceError::Api`
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(WorkspaceError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Stored content is normally a JSON string, but older rows may hold the
/// document itself
fn content_text(content: Option<Value>) -> Option<String> {
    match content? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl ProjectStore for HttpApiClient {
    async fn load_project(&self, project_id: &str) -> Result<Option<String>> {
        let url = self.url(&format!("/api/project/{}", project_id));
        log::debug!("Loading project from {}", url);

        let response = self.http_client.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            log::warn!("Project '{}' not found", project_id);
            return Ok(None);
        }
        let row: ProjectRow = Self::check(response).await?.json().await?;
        Ok(content_text(row.content))
    }

    async fn save_project(&self, project_id: &str, snapshot: &ProjectSnapshot) -> Result<()> {
        let url = self.url(&format!("/api/projects/{}", project_id));
        let response = self
            .http_client
            .put(&url)
            .json(&SaveRequest { content: snapshot })
            .send()
            .await?;
        Self::check(response).await?;
        log::info!(
            "Saved project '{}' ({} nodes, {} edges)",
            project_id,
            snapshot.nodes.len(),
            snapshot.edges.len()
        );
        Ok(())
    }
}

#[async_trait]
impl DatasetSource for HttpApiClient {
    async fn list_datasets(&self, student_id: &str) -> Result<Vec<DatasetRecord>> {
        let response = self
            .http_client
            .get(self.url("/api/datasets"))
            .query(&[("studentId", student_id)])
            .send()
            .await?;
        let records: Vec<DatasetRecord> = Self::check(response).await?.json().await?;
        log::debug!("Fetched {} dataset(s) for '{}'", records.len(), student_id);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpApiClient::new("http://localhost:3001/");
        assert_eq!(client.url("/api/datasets"), "http://localhost:3001/api/datasets");
    }

    #[test]
    fn test_content_text_shapes() {
        assert_eq!(
            content_text(Some(json!("{\"nodes\":[]}"))).as_deref(),
            Some("{\"nodes\":[]}")
        );
        assert_eq!(
            content_text(Some(json!({"nodes": [], "edges": [], "log": ""}))).as_deref(),
            Some(r#"{"edges":[],"log":"","nodes":[]}"#)
        );
        assert!(content_text(Some(Value::Null)).is_none());
        assert!(content_text(None).is_none());
    }

    #[test]
    fn test_save_request_wraps_snapshot() {
        let snapshot = ProjectSnapshot {
            log: "ok".to_string(),
            ..ProjectSnapshot::default()
        };
        let body = serde_json::to_value(SaveRequest { content: &snapshot }).unwrap();
        assert_eq!(body, json!({"content": {"nodes": [], "edges": [], "log": "ok"}}));
    }

    #[test]
    fn test_project_row_ignores_other_columns() {
        let row: ProjectRow = serde_json::from_value(json!({
            "id": "1712",
            "student_id": "s1",
            "title": "Iris",
            "content": "{}"
        }))
        .unwrap();
        assert_eq!(content_text(row.content).as_deref(), Some("{}"));
    }
}
