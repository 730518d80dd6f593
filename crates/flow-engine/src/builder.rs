//! Fluent builder for pipeline graphs
//!
//! Builds a `FlowGraph` with caller-chosen node ids, which the store never
//! hands out. Intended for fixtures, seeded projects and tests.
//!
//! ```ignore
//! let graph = GraphBuilder::new()
//!     .load("a", "ds-1")
//!     .column_drop("drop", &["age"])
//!     .data_viewer("view")
//!     .connect("a", "drop")
//!     .connect("drop", "view")
//!     .build();
//! ```
//!
//! Positions follow the store's staggered placement unless set with `at`.

use crate::config::CanvasConfig;
use crate::store::GraphStore;
use crate::types::{
    DatasetStep, FlowEdge, FlowGraph, FlowNode, NodeData, NodeKind, Point, SourceHandle, TargetHandle,
};

pub struct GraphBuilder {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    edge_counter: usize,
    config: CanvasConfig,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
            config,
        }
    }

    /// Add a node with explicit parameters; its label is the kind name
    pub fn add_node(mut self, id: impl Into<String>, data: NodeData) -> Self {
        let (ox, oy) = self.config.new_node_origin;
        let offset = self.nodes.len() as f64 * self.config.new_node_stagger;
        let position = Point::new(ox + offset, oy + offset);
        let label = data.kind().as_str().to_string();
        self.nodes.push(FlowNode::new(id, label, position, data));
        self
    }

    /// Add a node with the defaults of its kind
    pub fn add_kind(self, id: impl Into<String>, kind: NodeKind) -> Self {
        self.add_node(id, NodeData::defaults(kind, None, None))
    }

    /// Add a dataset-load node bound to a catalog record
    pub fn load(self, id: impl Into<String>, dataset_id: impl Into<String>) -> Self {
        self.add_node(
            id,
            NodeData::Dataset(DatasetStep::Load {
                dataset_id: Some(dataset_id.into()),
                dataset_name: None,
            }),
        )
    }

    pub fn column_drop(self, id: impl Into<String>, columns: &[&str]) -> Self {
        self.add_node(
            id,
            NodeData::Dataset(DatasetStep::ColumnDrop {
                dropped_columns: columns.iter().map(|c| c.to_string()).collect(),
                target_column: None,
            }),
        )
    }

    pub fn concatenate(self, id: impl Into<String>) -> Self {
        self.add_node(id, NodeData::Dataset(DatasetStep::Concatenate))
    }

    pub fn data_viewer(self, id: impl Into<String>) -> Self {
        self.add_node(id, NodeData::Dataset(DatasetStep::DataViewer))
    }

    /// Move the most recently added node
    pub fn at(mut self, x: f64, y: f64) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.position = Point::new(x, y);
        }
        self
    }

    /// Set the label of the most recently added node
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.label = label.into();
        }
        self
    }

    /// Connect right output to left input (auto-generates edge ID)
    pub fn connect(self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.connect_handles(source, SourceHandle::Right, target, TargetHandle::Left)
    }

    /// Connect with explicit ports (auto-generates edge ID)
    pub fn connect_handles(
        mut self,
        source: impl Into<String>,
        source_handle: SourceHandle,
        target: impl Into<String>,
        target_handle: TargetHandle,
    ) -> Self {
        self.edge_counter += 1;
        self.edges.push(FlowEdge {
            id: format!("edge-{}", self.edge_counter),
            source: source.into(),
            target: target.into(),
            source_handle,
            target_handle,
        });
        self
    }

    /// Add an edge with a specific ID
    ///
    /// No endpoint checks happen here, so the result may hold edges the
    /// store would refuse.
    pub fn add_edge_with_id(
        mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.edges.push(FlowEdge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: SourceHandle::default(),
            target_handle: TargetHandle::default(),
        });
        self
    }

    pub fn build(self) -> FlowGraph {
        FlowGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    /// Load the graph into a fresh store, pruning edges the store rejects
    pub fn into_store(self) -> GraphStore {
        let mut store = GraphStore::with_config(self.config);
        store.load(self.build());
        store
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
