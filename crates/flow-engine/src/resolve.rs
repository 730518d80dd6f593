//! Upstream dataset resolution
//!
//! Walks incoming edges from a node back to the dataset-load nodes that feed
//! it and materializes the table that reaches the node. Only two node kinds
//! reshape rows on the way: column drop removes columns, and concatenate
//! stacks every input vertically. Everything else passes data through.
//!
//! Nothing is cached; each call reads the current store and catalog.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dataset::{concat_tables, drop_columns, ResolvedView};
use crate::store::GraphStore;
use crate::types::{DatasetStep, NodeData};

/// Parsed dataset content has the shape of a resolved view
pub type DatasetContent = ResolvedView;

/// One entry of the dataset catalog
///
/// Rows come straight from the database, so any column other than `id` may
/// be `null`; those decode to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub owner_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    /// Opaque JSON text holding `{data}` or `{splits}`
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "flag")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

impl DatasetRecord {
    pub fn parse_content(&self) -> Option<DatasetContent> {
        DatasetContent::parse(&self.content)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Number(n)) => n.to_string(),
        None => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Database rows store booleans as 0/1
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Bool(b)) => b,
        Some(Raw::Int(i)) => i != 0,
        None => false,
    })
}

/// Read-only, ordered collection of datasets available to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetCatalog {
    records: Vec<DatasetRecord>,
}

impl DatasetCatalog {
    pub fn new(records: Vec<DatasetRecord>) -> Self {
        Self { records }
    }

    pub fn find(&self, id: &str) -> Option<&DatasetRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parsed content of a dataset, if it exists and parses
    pub fn load(&self, id: &str) -> Option<ResolvedView> {
        let record = self.find(id);
        if record.is_none() {
            log::debug!("Dataset '{}' is not in the catalog", id);
        }
        record?.parse_content()
    }
}

/// Resolves the dataset reaching a node against a store and a catalog
pub struct Resolver<'a> {
    store: &'a GraphStore,
    catalog: &'a DatasetCatalog,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a GraphStore, catalog: &'a DatasetCatalog) -> Self {
        Self { store, catalog }
    }

    /// The dataset reaching `node_id`, or `None` when it has no input or
    /// resolution fails at any ancestor.
    ///
    /// A concatenate node resolves to the merge of all its inputs; every
    /// other node follows its first incoming edge. Walking back onto a node
    /// already on the current path is a cycle and fails.
    pub fn resolve(&self, node_id: &str) -> Option<ResolvedView> {
        let mut path = HashSet::new();
        self.resolve_on_path(node_id, &mut path)
    }

    fn resolve_on_path(&self, node_id: &str, path: &mut HashSet<String>) -> Option<ResolvedView> {
        if !path.insert(node_id.to_string()) {
            log::warn!("Cycle through node '{}' while resolving upstream data", node_id);
            return None;
        }
        let result = self.inputs_of(node_id, path);
        path.remove(node_id);
        result
    }

    fn inputs_of(&self, node_id: &str, path: &mut HashSet<String>) -> Option<ResolvedView> {
        let node = self.store.node(node_id)?;
        if node.accepts_multiple_inputs() {
            return self.merge_inputs(node_id, path);
        }
        let edge = self.store.incoming_edges(node_id).next()?;
        self.output_of(&edge.source, path)
    }

    /// What a node emits downstream
    fn output_of(&self, node_id: &str, path: &mut HashSet<String>) -> Option<ResolvedView> {
        let node = self.store.node(node_id)?;
        match &node.data {
            NodeData::Dataset(DatasetStep::Load { dataset_id, .. }) => {
                self.catalog.load(dataset_id.as_deref()?)
            }
            NodeData::Dataset(DatasetStep::ColumnDrop {
                dropped_columns, ..
            }) => {
                let upstream = self.resolve_on_path(node_id, path)?;
                if dropped_columns.is_empty() {
                    return Some(upstream);
                }
                Some(upstream.map_tables(|t| drop_columns(t, dropped_columns)))
            }
            _ => self.resolve_on_path(node_id, path),
        }
    }

    /// Vertical concatenation of every input's `data`; failed inputs are
    /// dropped. Inputs that resolve without `data` give a view with no data.
    fn merge_inputs(&self, node_id: &str, path: &mut HashSet<String>) -> Option<ResolvedView> {
        let sources: Vec<&str> = self
            .store
            .incoming_edges(node_id)
            .map(|e| e.source.as_str())
            .collect();
        let inputs: Vec<ResolvedView> = sources
            .into_iter()
            .filter_map(|source| self.output_of(source, path))
            .collect();
        if inputs.is_empty() {
            return None;
        }

        Some(ResolvedView {
            data: concat_tables(inputs.into_iter().filter_map(|v| v.data)),
            splits: None,
        })
    }
}
