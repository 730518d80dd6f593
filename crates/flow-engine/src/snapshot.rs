//! Project snapshot codec
//!
//! A saved project is one JSON document: `{nodes, edges, log}`, where `log`
//! is the last simulation console text. It is written whole on save and
//! restored whole on load.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{FlowEdge, FlowGraph, FlowNode};

/// Whole-document project state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub log: String,
}

impl ProjectSnapshot {
    /// Capture the store contents together with the console log
    pub fn capture(store: &GraphStore, log: impl Into<String>) -> Self {
        let FlowGraph { nodes, edges } = store.snapshot();
        Self {
            nodes,
            edges,
            log: log.into(),
        }
    }

    pub fn graph(&self) -> FlowGraph {
        FlowGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    pub fn into_parts(self) -> (FlowGraph, String) {
        (
            FlowGraph {
                nodes: self.nodes,
                edges: self.edges,
            },
            self.log,
        )
    }

    /// Strict parse
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse persisted content, tolerating damage
    ///
    /// Content that is not a JSON object is logged and gives `None`. Inside
    /// an object, nodes or edges that fail to decode are skipped
    /// individually, and a non-string `log` becomes empty.
    pub fn decode_lenient(content: &str) -> Option<Self> {
        let value: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Malformed project content: {}", e);
                return None;
            }
        };
        let Value::Object(mut doc) = value else {
            log::warn!("Project content is not an object");
            return None;
        };

        Some(Self {
            nodes: decode_items(doc.remove("nodes"), "node"),
            edges: decode_items(doc.remove("edges"), "edge"),
            log: match doc.remove("log") {
                Some(Value::String(log)) => log,
                _ => String::new(),
            },
        })
    }
}

fn decode_items<T: serde::de::DeserializeOwned>(value: Option<Value>, what: &str) -> Vec<T> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::warn!("Skipping malformed {}: {}", what, e);
                None
            }
        })
        .collect()
}
