//! Workspace configuration
//!
//! Collaborator endpoints and editor limits. Every value has a default so a
//! session can start without any environment set up.

use flow_engine::CanvasConfig;
use serde::{Deserialize, Serialize};

pub mod defaults {
    /// Project and dataset API
    pub const API_BASE_URL: &str = "http://localhost:3001";
    /// Text generation REST API
    pub const GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const TEXT_MODEL: &str = flow_engine::simulation::TEXT_MODEL;
    /// Undo snapshots kept per session
    pub const HISTORY_DEPTH: usize = 100;
}

pub const ENV_API_BASE_URL: &str = "FLOW_API_BASE_URL";
pub const ENV_GENAI_BASE_URL: &str = "FLOW_GENAI_BASE_URL";
pub const ENV_TEXT_MODEL: &str = "FLOW_TEXT_MODEL";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_HISTORY_DEPTH: &str = "FLOW_HISTORY_DEPTH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    pub api_base_url: String,
    pub genai_base_url: String,
    pub text_model: String,
    /// Key for the text generation API; requests go out without one if unset
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub history_depth: usize,
    pub canvas: CanvasConfig,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            api_base_url: defaults::API_BASE_URL.to_string(),
            genai_base_url: defaults::GENAI_BASE_URL.to_string(),
            text_model: defaults::TEXT_MODEL.to_string(),
            api_key: None,
            history_depth: defaults::HISTORY_DEPTH,
            canvas: CanvasConfig::default(),
        }
    }
}

impl WorkspaceConfig {
    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing or blank values keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(url) = get(ENV_API_BASE_URL) {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get(ENV_GENAI_BASE_URL) {
            config.genai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = get(ENV_TEXT_MODEL) {
            config.text_model = model;
        }
        config.api_key = get(ENV_API_KEY);
        if let Some(depth) = get(ENV_HISTORY_DEPTH) {
            match depth.parse::<usize>() {
                Ok(depth) => config.history_depth = depth,
                Err(e) => log::warn!("Ignoring {}='{}': {}", ENV_HISTORY_DEPTH, depth, e),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_environment() {
        let config = WorkspaceConfig::from_lookup(|_| None);
        assert_eq!(config, WorkspaceConfig::default());
        assert_eq!(config.text_model, "gemini-3-flash-preview");
        assert_eq!(config.api_base_url, "http://localhost:3001");
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_BASE_URL, "http://lab.example:8080/"),
            (ENV_TEXT_MODEL, "  custom-model "),
            (ENV_API_KEY, "secret"),
            (ENV_HISTORY_DEPTH, "not-a-number"),
        ]);
        let config = WorkspaceConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_base_url, "http://lab.example:8080");
        assert_eq!(config.text_model, "custom-model");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.history_depth, defaults::HISTORY_DEPTH);
        assert_eq!(config.genai_base_url, defaults::GENAI_BASE_URL);
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = WorkspaceConfig {
            api_key: Some("secret".to_string()),
            ..WorkspaceConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
