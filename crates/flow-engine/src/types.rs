//! Core types for pipeline graphs
//!
//! These types define the nodes, edges, ports and per-kind node data of a
//! pipeline graph. Node data is a tagged union keyed by `NodeKind`; on the
//! wire it keeps the flat object shape used by saved projects.

use std::ops::{Add, Sub};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// A point (or displacement) in canvas space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// The kind of a pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Dataset,
    Preprocess,
    Model,
    Training,
    Evaluation,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Preprocess => "preprocess",
            Self::Model => "model",
            Self::Training => "training",
            Self::Evaluation => "evaluation",
        }
    }
}

/// Output port of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHandle {
    #[default]
    Right,
    Bottom,
}

/// Input port of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetHandle {
    #[default]
    Left,
    Top,
}

/// Any of the four ports, as reported by a pointer hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    Right,
    Bottom,
    Left,
    Top,
}

impl Handle {
    pub const ALL: [Handle; 4] = [Handle::Right, Handle::Bottom, Handle::Left, Handle::Top];

    /// The output port this handle names, if it is one
    pub fn as_source(self) -> Option<SourceHandle> {
        match self {
            Self::Right => Some(SourceHandle::Right),
            Self::Bottom => Some(SourceHandle::Bottom),
            Self::Left | Self::Top => None,
        }
    }

    /// The input port this handle names, if it is one
    pub fn as_target(self) -> Option<TargetHandle> {
        match self {
            Self::Left => Some(TargetHandle::Left),
            Self::Top => Some(TargetHandle::Top),
            Self::Right | Self::Bottom => None,
        }
    }
}

impl From<SourceHandle> for Handle {
    fn from(handle: SourceHandle) -> Self {
        match handle {
            SourceHandle::Right => Handle::Right,
            SourceHandle::Bottom => Handle::Bottom,
        }
    }
}

impl From<TargetHandle> for Handle {
    fn from(handle: TargetHandle) -> Self {
        match handle {
            TargetHandle::Left => Handle::Left,
            TargetHandle::Top => Handle::Top,
        }
    }
}

/// Preprocessing method chosen for a preprocess node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PreprocessMethod {
    Normalization,
    Standardization,
    OneHot,
    Imputer,
    Resize,
    Grayscale,
    Augmentation,
    Other(String),
}

impl PreprocessMethod {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normalization => "Normalization",
            Self::Standardization => "Standardization",
            Self::OneHot => "OneHot",
            Self::Imputer => "Imputer",
            Self::Resize => "Resize",
            Self::Grayscale => "Grayscale",
            Self::Augmentation => "Augmentation",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for PreprocessMethod {
    fn from(value: &str) -> Self {
        match value {
            "Normalization" => Self::Normalization,
            "Standardization" => Self::Standardization,
            "OneHot" => Self::OneHot,
            "Imputer" => Self::Imputer,
            "Resize" => Self::Resize,
            "Grayscale" => Self::Grayscale,
            "Augmentation" => Self::Augmentation,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for PreprocessMethod {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<PreprocessMethod> for String {
    fn from(method: PreprocessMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Sub-type of a dataset node
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetStep {
    /// Binds a catalog dataset
    Load {
        dataset_id: Option<String>,
        dataset_name: Option<String>,
    },
    /// Removes columns from the upstream tables
    ColumnDrop {
        dropped_columns: Vec<String>,
        target_column: Option<String>,
    },
    /// Vertically merges every incoming dataset
    Concatenate,
    /// Read-only view of the upstream data
    DataViewer,
    /// Unrecognized sub-type; behaves as a passthrough
    Other(String),
}

impl DatasetStep {
    pub const LOAD: &'static str = "dataset_load";
    pub const COLUMN_DROP: &'static str = "column_drop";
    pub const CONCATENATE: &'static str = "concatenate";
    pub const DATA_VIEWER: &'static str = "data_viewer";

    /// Build an empty step from a sub-type tag; no tag means `Load`
    pub fn from_subtype(subtype: Option<&str>) -> Self {
        match subtype {
            None | Some(Self::LOAD) => Self::Load {
                dataset_id: None,
                dataset_name: None,
            },
            Some(Self::COLUMN_DROP) => Self::ColumnDrop {
                dropped_columns: Vec::new(),
                target_column: None,
            },
            Some(Self::CONCATENATE) => Self::Concatenate,
            Some(Self::DATA_VIEWER) => Self::DataViewer,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    pub fn subtype(&self) -> &str {
        match self {
            Self::Load { .. } => Self::LOAD,
            Self::ColumnDrop { .. } => Self::COLUMN_DROP,
            Self::Concatenate => Self::CONCATENATE,
            Self::DataViewer => Self::DATA_VIEWER,
            Self::Other(tag) => tag,
        }
    }
}

/// Per-kind parameters of a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Dataset(DatasetStep),
    Preprocess {
        /// Palette family, e.g. "tabular" or "image"
        family: Option<String>,
        method: Option<PreprocessMethod>,
        /// Columns the method applies to, filled from upstream inference
        selected_columns: Vec<String>,
    },
    Model {
        /// "classification" or "regression"
        task: Option<String>,
        variant: String,
    },
    Training {
        epochs: u32,
        learning_rate: f64,
    },
    Evaluation,
}

impl NodeData {
    pub const DEFAULT_MODEL_VARIANT: &'static str = "CNN";
    pub const DEFAULT_EPOCHS: u32 = 10;
    pub const DEFAULT_LEARNING_RATE: f64 = 0.001;

    /// Type-appropriate defaults for a freshly created node
    pub fn defaults(kind: NodeKind, subtype: Option<&str>, variant: Option<&str>) -> Self {
        match kind {
            NodeKind::Dataset => Self::Dataset(DatasetStep::from_subtype(subtype)),
            NodeKind::Preprocess => Self::Preprocess {
                family: subtype.map(str::to_string),
                method: variant.map(PreprocessMethod::from),
                selected_columns: Vec::new(),
            },
            NodeKind::Model => Self::Model {
                task: subtype.map(str::to_string),
                variant: variant.unwrap_or(Self::DEFAULT_MODEL_VARIANT).to_string(),
            },
            NodeKind::Training => Self::Training {
                epochs: Self::DEFAULT_EPOCHS,
                learning_rate: Self::DEFAULT_LEARNING_RATE,
            },
            NodeKind::Evaluation => Self::Evaluation,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Dataset(_) => NodeKind::Dataset,
            Self::Preprocess { .. } => NodeKind::Preprocess,
            Self::Model { .. } => NodeKind::Model,
            Self::Training { .. } => NodeKind::Training,
            Self::Evaluation => NodeKind::Evaluation,
        }
    }

    pub fn dataset_step(&self) -> Option<&DatasetStep> {
        match self {
            Self::Dataset(step) => Some(step),
            _ => None,
        }
    }

    /// Shallow-merge a patch; fields that do not apply to this kind are ignored.
    ///
    /// Returns true if anything changed.
    pub fn apply(&mut self, patch: &NodePatch) -> bool {
        let before = self.clone();
        match self {
            Self::Dataset(DatasetStep::Load {
                dataset_id,
                dataset_name,
            }) => {
                if let Some(id) = &patch.dataset_id {
                    *dataset_id = id.clone();
                }
                if let Some(name) = &patch.dataset_name {
                    *dataset_name = name.clone();
                }
            }
            Self::Dataset(DatasetStep::ColumnDrop {
                dropped_columns,
                target_column,
            }) => {
                if let Some(columns) = &patch.dropped_columns {
                    *dropped_columns = columns.clone();
                }
                if let Some(target) = &patch.target_column {
                    *target_column = target.clone();
                }
            }
            Self::Dataset(_) | Self::Evaluation => {}
            Self::Preprocess {
                method,
                selected_columns,
                ..
            } => {
                if let Some(m) = &patch.preprocess_method {
                    *method = Some(m.clone());
                }
                if let Some(columns) = &patch.selected_columns {
                    *selected_columns = columns.clone();
                }
            }
            Self::Model { variant, .. } => {
                if let Some(v) = &patch.model_variant {
                    *variant = v.clone();
                }
            }
            Self::Training {
                epochs,
                learning_rate,
            } => {
                if let Some(e) = patch.epochs {
                    *epochs = e;
                }
                if let Some(lr) = patch.learning_rate {
                    *learning_rate = lr;
                }
            }
        }
        *self != before
    }
}

/// Partial update for a node's data
///
/// `None` leaves a field untouched. For the nullable dataset fields the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label_override: Option<Option<String>>,
    pub dataset_id: Option<Option<String>>,
    pub dataset_name: Option<Option<String>>,
    pub dropped_columns: Option<Vec<String>>,
    pub target_column: Option<Option<String>>,
    pub preprocess_method: Option<PreprocessMethod>,
    pub selected_columns: Option<Vec<String>>,
    pub model_variant: Option<String>,
    pub epochs: Option<u32>,
    pub learning_rate: Option<f64>,
}

impl NodePatch {
    pub fn label_override(label: impl Into<String>) -> Self {
        Self {
            label_override: Some(Some(label.into())),
            ..Self::default()
        }
    }

    pub fn dataset(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            dataset_id: Some(Some(id.into())),
            dataset_name: Some(name),
            ..Self::default()
        }
    }

    pub fn dropped_columns(columns: Vec<String>) -> Self {
        Self {
            dropped_columns: Some(columns),
            ..Self::default()
        }
    }

    pub fn target_column(column: impl Into<String>) -> Self {
        Self {
            target_column: Some(Some(column.into())),
            ..Self::default()
        }
    }

    pub fn training(epochs: Option<u32>, learning_rate: Option<f64>) -> Self {
        Self {
            epochs,
            learning_rate,
            ..Self::default()
        }
    }

    pub fn model_variant(variant: impl Into<String>) -> Self {
        Self {
            model_variant: Some(variant.into()),
            ..Self::default()
        }
    }

    pub fn preprocess_method(method: PreprocessMethod) -> Self {
        Self {
            preprocess_method: Some(method),
            ..Self::default()
        }
    }

    pub fn selected_columns(columns: Vec<String>) -> Self {
        Self {
            selected_columns: Some(columns),
            ..Self::default()
        }
    }
}

/// A node instance in a pipeline graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNode", into = "WireNode")]
pub struct FlowNode {
    /// Unique identifier, stable for the node's lifetime
    pub id: NodeId,
    /// Display string set at creation
    pub label: String,
    /// Top-left corner in canvas space
    pub position: Point,
    pub data: NodeData,
    /// Free-text label entered in the property editor
    pub label_override: Option<String>,
}

impl FlowNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, position: Point, data: NodeData) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            position,
            data,
            label_override: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    /// Label to render: the override when one is set
    pub fn display_label(&self) -> &str {
        self.label_override
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.label)
    }

    /// Whether several incoming edges are meaningful for this node
    pub fn accepts_multiple_inputs(&self) -> bool {
        matches!(self.data, NodeData::Dataset(DatasetStep::Concatenate))
    }

    /// Apply a partial update; returns true if anything changed
    pub fn apply_patch(&mut self, patch: &NodePatch) -> bool {
        let mut changed = self.data.apply(patch);
        if let Some(label) = &patch.label_override {
            if self.label_override != *label {
                self.label_override = label.clone();
                changed = true;
            }
        }
        changed
    }
}

/// A directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub source_handle: SourceHandle,
    #[serde(default)]
    pub target_handle: TargetHandle,
}

impl FlowEdge {
    /// Check if this edge touches a node at either end
    pub fn involves_node(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A complete pipeline graph (nodes in z-order, last = topmost)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<FlowNode>,
    #[serde(default)]
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&FlowEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Get the IDs of nodes that feed this node
    pub fn get_dependencies(&self, node_id: &str) -> Vec<NodeId> {
        self.incoming_edges(node_id).map(|e| e.source.clone()).collect()
    }

    /// Get the IDs of nodes fed by this node
    pub fn get_dependents(&self, node_id: &str) -> Vec<NodeId> {
        self.outgoing_edges(node_id).map(|e| e.target.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// Saved-project shape of a node: kind under `type`, parameters flattened
/// into a single `data` object.
#[derive(Serialize, Deserialize)]
struct WireNode {
    id: NodeId,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    label: String,
    #[serde(default)]
    position: Point,
    #[serde(default, deserialize_with = "lenient")]
    data: Option<WireData>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireData {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    epochs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    learning_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    model_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    preprocess_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    model_task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    dataset_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    dataset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    dataset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    dropped_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    target_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    selected_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    label_override: Option<String>,
}

/// Decode a value, treating a wrongly-typed value as absent
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<WireNode> for FlowNode {
    fn from(wire: WireNode) -> Self {
        let d = wire.data.unwrap_or_default();
        let data = match wire.kind {
            NodeKind::Dataset => {
                let subtype = non_empty(d.dataset_subtype);
                Self::dataset_from_wire(
                    subtype.as_deref(),
                    d.dataset_id,
                    d.dataset_name,
                    d.dropped_columns,
                    d.target_column,
                )
            }
            NodeKind::Preprocess => NodeData::Preprocess {
                family: d.model_task,
                method: d
                    .preprocess_type
                    .or(d.model_type)
                    .map(PreprocessMethod::from),
                selected_columns: d.selected_columns.unwrap_or_default(),
            },
            NodeKind::Model => NodeData::Model {
                task: d.model_task,
                variant: d
                    .model_type
                    .unwrap_or_else(|| NodeData::DEFAULT_MODEL_VARIANT.to_string()),
            },
            NodeKind::Training => NodeData::Training {
                epochs: d.epochs.unwrap_or(NodeData::DEFAULT_EPOCHS),
                learning_rate: d.learning_rate.unwrap_or(NodeData::DEFAULT_LEARNING_RATE),
            },
            NodeKind::Evaluation => NodeData::Evaluation,
        };
        FlowNode {
            id: wire.id,
            label: wire.label,
            position: wire.position,
            data,
            label_override: d.label_override,
        }
    }
}

impl FlowNode {
    fn dataset_from_wire(
        subtype: Option<&str>,
        dataset_id: Option<String>,
        dataset_name: Option<String>,
        dropped_columns: Option<Vec<String>>,
        target_column: Option<String>,
    ) -> NodeData {
        let step = match DatasetStep::from_subtype(subtype) {
            DatasetStep::Load { .. } => DatasetStep::Load {
                dataset_id: non_empty(dataset_id),
                dataset_name,
            },
            DatasetStep::ColumnDrop { .. } => DatasetStep::ColumnDrop {
                dropped_columns: dropped_columns.unwrap_or_default(),
                target_column,
            },
            other => other,
        };
        NodeData::Dataset(step)
    }
}

impl From<FlowNode> for WireNode {
    fn from(node: FlowNode) -> Self {
        let kind = node.kind();
        let mut d = WireData {
            label_override: node.label_override,
            ..WireData::default()
        };
        match node.data {
            NodeData::Dataset(step) => {
                d.dataset_subtype = Some(step.subtype().to_string());
                match step {
                    DatasetStep::Load {
                        dataset_id,
                        dataset_name,
                    } => {
                        d.dataset_id = dataset_id;
                        d.dataset_name = dataset_name;
                    }
                    DatasetStep::ColumnDrop {
                        dropped_columns,
                        target_column,
                    } => {
                        d.dropped_columns = Some(dropped_columns);
                        d.target_column = target_column;
                    }
                    DatasetStep::Concatenate | DatasetStep::DataViewer | DatasetStep::Other(_) => {}
                }
            }
            NodeData::Preprocess {
                family,
                method,
                selected_columns,
            } => {
                d.model_task = family;
                d.preprocess_type = method.map(String::from);
                if !selected_columns.is_empty() {
                    d.selected_columns = Some(selected_columns);
                }
            }
            NodeData::Model { task, variant } => {
                d.model_task = task;
                d.model_type = Some(variant);
            }
            NodeData::Training {
                epochs,
                learning_rate,
            } => {
                d.epochs = Some(epochs);
                d.learning_rate = Some(learning_rate);
            }
            NodeData::Evaluation => {}
        }
        WireNode {
            id: node.id,
            kind,
            label: node.label,
            position: node.position,
            data: Some(d),
        }
    }
}
