//! In-memory graph store for one editing session
//!
//! `GraphStore` exclusively owns every node and edge plus the current
//! selection. It maintains the structural invariants: no self-loops, at most
//! one edge per ordered (source, target) pair, and no edge referencing a
//! missing node. Rejected mutations leave the store untouched and report
//! `false` / `None`.

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::types::{
    EdgeId, FlowEdge, FlowGraph, FlowNode, NodeData, NodeId, NodeKind, NodePatch, Point,
    SourceHandle, TargetHandle,
};

/// At most one selected node or one selected edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

impl Selection {
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn edge_id(&self) -> Option<&str> {
        match self {
            Self::Edge(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Ordered node and edge collections with invariant maintenance
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Nodes in z-order (last = topmost)
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
    selection: Selection,
    config: CanvasConfig,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Append a node with type-appropriate default data
    ///
    /// The position is staggered diagonally by the current node count so new
    /// nodes never land exactly on top of each other.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        label: impl Into<String>,
        subtype: Option<&str>,
        variant: Option<&str>,
    ) -> &FlowNode {
        let (ox, oy) = self.config.new_node_origin;
        let offset = self.nodes.len() as f64 * self.config.new_node_stagger;
        let node = FlowNode::new(
            uuid::Uuid::new_v4().to_string(),
            label,
            Point::new(ox + offset, oy + offset),
            NodeData::defaults(kind, subtype, variant),
        );
        log::debug!("Added {} node '{}'", kind.as_str(), node.id);

        self.nodes.push(node);
        &self.nodes[self.nodes.len() - 1]
    }

    /// Replace a node's position; the canvas is unbounded
    pub fn update_node_position(&mut self, id: &str, x: f64, y: f64) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.position = Point::new(x, y);
                true
            }
            None => false,
        }
    }

    /// Shallow-merge a patch into a node's data
    ///
    /// Returns true if the node exists and anything changed.
    pub fn update_node_data(&mut self, id: &str, patch: &NodePatch) -> bool {
        match self.node_mut(id) {
            Some(node) => node.apply_patch(patch),
            None => {
                log::debug!("Ignoring data update for unknown node '{}'", id);
                false
            }
        }
    }

    /// Remove a node and every edge touching it
    pub fn delete_node(&mut self, id: &str) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.id == id) else {
            return false;
        };
        self.nodes.remove(index);

        let mut removed_edges = Vec::new();
        self.edges.retain(|e| {
            if e.involves_node(id) {
                removed_edges.push(e.id.clone());
                false
            } else {
                true
            }
        });

        let clear = match &self.selection {
            Selection::Node(selected) => selected == id,
            Selection::Edge(selected) => removed_edges.contains(selected),
            Selection::None => false,
        };
        if clear {
            self.selection = Selection::None;
        }

        log::debug!(
            "Deleted node '{}' and {} attached edge(s)",
            id,
            removed_edges.len()
        );
        true
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Connect two nodes
    ///
    /// Rejected (returns `None`) for self-loops, an existing edge with the
    /// same (source, target) pair, or an endpoint that does not exist.
    pub fn add_edge(
        &mut self,
        source: &str,
        target: &str,
        source_handle: SourceHandle,
        target_handle: TargetHandle,
    ) -> Option<EdgeId> {
        if source == target {
            log::debug!("Rejected self-loop on '{}'", source);
            return None;
        }
        if self.node(source).is_none() || self.node(target).is_none() {
            log::debug!("Rejected edge {} -> {}: unknown endpoint", source, target);
            return None;
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            log::debug!("Rejected duplicate edge {} -> {}", source, target);
            return None;
        }

        let id = self.next_edge_id(source, target);
        self.edges.push(FlowEdge {
            id: id.clone(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle,
            target_handle,
        });
        Some(id)
    }

    /// Remove an edge by id
    pub fn delete_edge(&mut self, id: &str) -> bool {
        let Some(index) = self.edges.iter().position(|e| e.id == id) else {
            return false;
        };
        self.edges.remove(index);
        if self.selection.edge_id() == Some(id) {
            self.selection = Selection::None;
        }
        true
    }

    /// Detach an edge so its connection can be redrawn from the same source
    ///
    /// Removes the edge and returns its original source and source handle.
    pub fn reconnect_edge_source(&mut self, edge_id: &str) -> Option<(NodeId, SourceHandle)> {
        let edge = self.edge(edge_id)?;
        let origin = (edge.source.clone(), edge.source_handle);
        self.delete_edge(edge_id);
        Some(origin)
    }

    /// Edge ids combine source, target and creation time; a numeric suffix
    /// is appended if two edges are created within the same millisecond.
    fn next_edge_id(&self, source: &str, target: &str) -> EdgeId {
        let base = format!(
            "{}-{}-{}",
            source,
            target,
            chrono::Utc::now().timestamp_millis()
        );
        if self.edge(&base).is_none() {
            return base;
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| self.edge(candidate).is_none())
            .unwrap_or(base)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut FlowNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&FlowEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn incoming_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    pub fn outgoing_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FlowEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// The edge arriving at a specific input port of a node
    pub fn incoming_edge_at(&self, id: &str, handle: TargetHandle) -> Option<&FlowEdge> {
        self.edges
            .iter()
            .find(|e| e.target == id && e.target_handle == handle)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Select a node; ignored if it does not exist
    pub fn select_node(&mut self, id: &str) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        self.selection = Selection::Node(id.to_string());
        true
    }

    /// Select an edge; ignored if it does not exist
    pub fn select_edge(&mut self, id: &str) -> bool {
        if self.edge(id).is_none() {
            return false;
        }
        self.selection = Selection::Edge(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// The currently selected node, looked up fresh
    pub fn selected_node(&self) -> Option<&FlowNode> {
        self.selection.node_id().and_then(|id| self.node(id))
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Copy the whole graph out of the store
    pub fn snapshot(&self) -> FlowGraph {
        FlowGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Replace the whole contents of the store
    ///
    /// Selection is cleared. A node repeating an earlier id is dropped. Edges
    /// that reference missing nodes, loop onto their own node, or repeat an
    /// earlier (source, target) pair are pruned.
    pub fn load(&mut self, graph: FlowGraph) {
        let FlowGraph {
            nodes: loaded,
            edges,
        } = graph;

        let mut nodes: Vec<FlowNode> = Vec::with_capacity(loaded.len());
        for node in loaded {
            if nodes.iter().any(|n| n.id == node.id) {
                log::warn!("Dropped node with duplicate id '{}' while loading graph", node.id);
                continue;
            }
            nodes.push(node);
        }

        let total = edges.len();
        let mut kept: Vec<FlowEdge> = Vec::with_capacity(total);
        for edge in edges {
            let known = nodes.iter().any(|n| n.id == edge.source)
                && nodes.iter().any(|n| n.id == edge.target);
            let duplicate = kept
                .iter()
                .any(|e| e.source == edge.source && e.target == edge.target);
            if known && edge.source != edge.target && !duplicate {
                kept.push(edge);
            }
        }
        if kept.len() < total {
            log::warn!("Pruned {} invalid edge(s) while loading graph", total - kept.len());
        }

        self.nodes = nodes;
        self.edges = kept;
        self.selection = Selection::None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatasetStep;

    fn store_with(n: usize) -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let ids = (0..n)
            .map(|i| {
                store
                    .add_node(NodeKind::Preprocess, format!("node {}", i), None, None)
                    .id
                    .clone()
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_add_node_staggers_position() {
        let mut store = GraphStore::new();
        let first = store.add_node(NodeKind::Dataset, "Dataset", None, None).position;
        let second = store.add_node(NodeKind::Model, "Model", None, None).position;
        assert_eq!(first, Point::new(100.0, 100.0));
        assert_eq!(second, Point::new(120.0, 120.0));
    }

    #[test]
    fn test_add_node_ids_unique() {
        let (store, ids) = store_with(3);
        assert_eq!(store.nodes().len(), 3);
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn test_add_node_dataset_subtype() {
        let mut store = GraphStore::new();
        let node = store.add_node(NodeKind::Dataset, "Dataset (Column Drop)", Some("column_drop"), None);
        assert!(matches!(
            node.data,
            NodeData::Dataset(DatasetStep::ColumnDrop { .. })
        ));
    }

    #[test]
    fn test_update_position_unbounded() {
        let (mut store, ids) = store_with(1);
        assert!(store.update_node_position(&ids[0], -5000.0, 1e7));
        assert_eq!(store.node(&ids[0]).unwrap().position, Point::new(-5000.0, 1e7));
        assert!(!store.update_node_position("missing", 0.0, 0.0));
    }

    #[test]
    fn test_update_node_data_merges() {
        let mut store = GraphStore::new();
        let id = store.add_node(NodeKind::Training, "Train", None, None).id.clone();
        assert!(store.update_node_data(&id, &NodePatch::training(None, Some(0.01))));
        assert_eq!(
            store.node(&id).unwrap().data,
            NodeData::Training {
                epochs: 10,
                learning_rate: 0.01
            }
        );
        assert!(!store.update_node_data("missing", &NodePatch::training(Some(1), None)));
    }

    #[test]
    fn test_self_loop_rejected() {
        let (mut store, ids) = store_with(1);
        assert!(store
            .add_edge(&ids[0], &ids[0], SourceHandle::Right, TargetHandle::Left)
            .is_none());
        assert!(store.edges().is_empty());
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let (mut store, ids) = store_with(2);
        assert!(store
            .add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left)
            .is_some());
        assert!(store
            .add_edge(&ids[0], &ids[1], SourceHandle::Bottom, TargetHandle::Top)
            .is_none());
        assert_eq!(store.edges().len(), 1);

        // The reverse direction is a different pair
        assert!(store
            .add_edge(&ids[1], &ids[0], SourceHandle::Right, TargetHandle::Left)
            .is_some());
    }

    #[test]
    fn test_edge_to_unknown_node_rejected() {
        let (mut store, ids) = store_with(1);
        assert!(store
            .add_edge(&ids[0], "ghost", SourceHandle::Right, TargetHandle::Left)
            .is_none());
    }

    #[test]
    fn test_edge_id_contains_endpoints() {
        let (mut store, ids) = store_with(2);
        let id = store
            .add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left)
            .unwrap();
        assert!(id.starts_with(&format!("{}-{}-", ids[0], ids[1])));
    }

    #[test]
    fn test_delete_node_cascades() {
        let (mut store, ids) = store_with(3);
        store.add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left);
        store.add_edge(&ids[1], &ids[2], SourceHandle::Right, TargetHandle::Left);
        store.add_edge(&ids[0], &ids[2], SourceHandle::Bottom, TargetHandle::Top);
        store.select_node(&ids[1]);

        assert!(store.delete_node(&ids[1]));
        assert!(store.edges().iter().all(|e| !e.involves_node(&ids[1])));
        assert_eq!(store.edges().len(), 1);
        assert!(store.selection().is_none());
        assert!(!store.delete_node(&ids[1]));
    }

    #[test]
    fn test_delete_node_clears_selected_attached_edge() {
        let (mut store, ids) = store_with(2);
        let edge = store
            .add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left)
            .unwrap();
        store.select_edge(&edge);
        store.delete_node(&ids[0]);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_delete_edge_clears_selection() {
        let (mut store, ids) = store_with(2);
        let edge = store
            .add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left)
            .unwrap();
        store.select_edge(&edge);
        assert!(store.delete_edge(&edge));
        assert!(store.selection().is_none());
        assert!(!store.delete_edge(&edge));
    }

    #[test]
    fn test_reconnect_returns_original_source() {
        let (mut store, ids) = store_with(2);
        let edge = store
            .add_edge(&ids[0], &ids[1], SourceHandle::Bottom, TargetHandle::Top)
            .unwrap();
        let origin = store.reconnect_edge_source(&edge).unwrap();
        assert_eq!(origin, (ids[0].clone(), SourceHandle::Bottom));
        assert!(store.edges().is_empty());
        assert!(store.reconnect_edge_source(&edge).is_none());
    }

    #[test]
    fn test_incoming_edge_at_handle() {
        let (mut store, ids) = store_with(3);
        store.add_edge(&ids[0], &ids[2], SourceHandle::Right, TargetHandle::Left);
        store.add_edge(&ids[1], &ids[2], SourceHandle::Right, TargetHandle::Top);
        assert_eq!(
            store.incoming_edge_at(&ids[2], TargetHandle::Top).unwrap().source,
            ids[1]
        );
        assert_eq!(
            store.incoming_edge_at(&ids[2], TargetHandle::Left).unwrap().source,
            ids[0]
        );
        assert!(store.incoming_edge_at(&ids[0], TargetHandle::Left).is_none());
    }

    #[test]
    fn test_incoming_edge_outlives_lookup_id() {
        let (mut store, ids) = store_with(2);
        store.add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left);
        let edge = {
            let id = ids[1].clone();
            store.incoming_edge_at(&id, TargetHandle::Left)
        };
        assert_eq!(edge.map(|e| e.source.as_str()), Some(ids[0].as_str()));
    }

    #[test]
    fn test_selection_exclusive() {
        let (mut store, ids) = store_with(2);
        let edge = store
            .add_edge(&ids[0], &ids[1], SourceHandle::Right, TargetHandle::Left)
            .unwrap();
        store.select_node(&ids[0]);
        store.select_edge(&edge);
        assert_eq!(store.selection(), &Selection::Edge(edge));
        assert!(store.selected_node().is_none());
        assert!(!store.select_node("ghost"));
    }

    #[test]
    fn test_load_prunes_invalid_edges() {
        let (store, ids) = store_with(2);
        let mut graph = store.snapshot();
        let edge = |id: &str, s: &str, t: &str| FlowEdge {
            id: id.to_string(),
            source: s.to_string(),
            target: t.to_string(),
            source_handle: SourceHandle::Right,
            target_handle: TargetHandle::Left,
        };
        graph.edges = vec![
            edge("ok", &ids[0], &ids[1]),
            edge("dup", &ids[0], &ids[1]),
            edge("dangling", &ids[0], "ghost"),
            edge("loop", &ids[1], &ids[1]),
        ];

        let mut restored = GraphStore::new();
        restored.load(graph);
        assert_eq!(restored.nodes().len(), 2);
        assert_eq!(restored.edges().len(), 1);
        assert_eq!(restored.edges()[0].id, "ok");
    }

    #[test]
    fn test_load_keeps_first_of_duplicate_node_ids() {
        let (store, ids) = store_with(2);
        let mut graph = store.snapshot();
        let mut twin = graph.nodes[1].clone();
        twin.id = ids[0].clone();
        twin.label = "twin".to_string();
        graph.nodes.push(twin);

        let mut restored = GraphStore::new();
        restored.load(graph);
        assert_eq!(restored.nodes().len(), 2);
        assert_eq!(restored.node(&ids[0]).unwrap().label, "node 0");
    }
}
