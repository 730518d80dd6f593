//! Pointer and keyboard state machine for the editor canvas
//!
//! `Interaction` turns gestures into `GraphStore` mutations. It never holds
//! node or edge values, only ids, and looks everything up in the store on
//! each event. Every transition reports an `InteractionOutcome` so the host
//! can decide whether to re-render or record an undo snapshot.
//!
//! ```text
//!            node body            pointer up
//!   Idle ───────────────▶ DraggingNode ─────────▶ Idle
//!    │  output handle / rewired input handle
//!    └──────────────────▶ DrawingConnection ─────▶ Idle (edge added or discarded)
//! ```

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::geometry::{self, CubicPath};
use crate::store::{GraphStore, Selection};
use crate::types::{EdgeId, FlowNode, Handle, NodeId, Point, SourceHandle};

/// Transient state of a connection being drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDrag {
    pub source: NodeId,
    pub source_handle: SourceHandle,
    /// Live cursor position in canvas space
    pub cursor: Point,
}

/// Pointer-driven mode
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Mode {
    #[default]
    Idle,
    DraggingNode {
        node_id: NodeId,
        /// Pointer position minus node position at grab time
        grab_offset: Point,
        /// Node position when the drag started
        origin: Point,
    },
    DrawingConnection(ConnectionDrag),
}

/// The element a pointer event landed on, as reported by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PointerTarget {
    Background,
    NodeBody { node_id: NodeId },
    Handle { node_id: NodeId, handle: Handle },
    Edge { edge_id: EdgeId },
    /// The delete button drawn on the selected edge
    DeleteButton { edge_id: EdgeId },
}

impl PointerTarget {
    pub fn node(id: impl Into<String>) -> Self {
        Self::NodeBody { node_id: id.into() }
    }

    pub fn handle(id: impl Into<String>, handle: Handle) -> Self {
        Self::Handle {
            node_id: id.into(),
            handle,
        }
    }

    pub fn edge(id: impl Into<String>) -> Self {
        Self::Edge { edge_id: id.into() }
    }
}

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Other,
}

/// What a transition changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum InteractionOutcome {
    /// Nothing happened
    None,
    /// A dragged node or the pending connection moved
    Moved,
    /// A node drag ended away from where it started
    DragFinished(NodeId),
    /// Selection changed
    Selected,
    ConnectionStarted,
    EdgeAdded(EdgeId),
    EdgeRemoved(EdgeId),
    NodeRemoved(NodeId),
    EditorOpened(NodeId),
    EditorClosed,
    /// A pending connection or drag was abandoned without side effect
    Cancelled,
}

impl InteractionOutcome {
    /// Whether the graph structure changed in a way worth an undo step
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DragFinished(_) | Self::EdgeAdded(_) | Self::EdgeRemoved(_) | Self::NodeRemoved(_)
        )
    }
}

/// Editor interaction state: current mode and the open property editor
#[derive(Debug, Clone, Default)]
pub struct Interaction {
    mode: Mode,
    /// Node whose property editor is open
    editing: Option<NodeId>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// The node under edit, looked up fresh in the store
    pub fn editing_node<'a>(&self, store: &'a GraphStore) -> Option<&'a FlowNode> {
        self.editing.as_deref().and_then(|id| store.node(id))
    }

    pub fn connection(&self) -> Option<&ConnectionDrag> {
        match &self.mode {
            Mode::DrawingConnection(drag) => Some(drag),
            _ => None,
        }
    }

    pub fn pointer_down(
        &mut self,
        store: &mut GraphStore,
        target: &PointerTarget,
        point: Point,
    ) -> InteractionOutcome {
        if self.editing.is_some() {
            return InteractionOutcome::None;
        }

        match target {
            PointerTarget::Background => {
                self.mode = Mode::Idle;
                if store.selection().is_none() {
                    InteractionOutcome::None
                } else {
                    store.clear_selection();
                    InteractionOutcome::Selected
                }
            }
            PointerTarget::NodeBody { node_id } => {
                let Some(position) = store.node(node_id).map(|n| n.position) else {
                    return InteractionOutcome::None;
                };
                self.mode = Mode::DraggingNode {
                    node_id: node_id.clone(),
                    grab_offset: point - position,
                    origin: position,
                };
                store.select_node(node_id);
                InteractionOutcome::Selected
            }
            PointerTarget::Handle { node_id, handle } => {
                self.start_connection(store, node_id, *handle, point)
            }
            PointerTarget::Edge { edge_id } => {
                if store.select_edge(edge_id) {
                    InteractionOutcome::Selected
                } else {
                    InteractionOutcome::None
                }
            }
            PointerTarget::DeleteButton { edge_id } => {
                if store.delete_edge(edge_id) {
                    InteractionOutcome::EdgeRemoved(edge_id.clone())
                } else {
                    InteractionOutcome::None
                }
            }
        }
    }

    /// Output handles start a fresh connection. An input handle with an edge
    /// already arriving at it detaches that edge and redraws it from the
    /// edge's original source.
    fn start_connection(
        &mut self,
        store: &mut GraphStore,
        node_id: &str,
        handle: Handle,
        point: Point,
    ) -> InteractionOutcome {
        if store.node(node_id).is_none() {
            return InteractionOutcome::None;
        }

        if let Some(source_handle) = handle.as_source() {
            self.mode = Mode::DrawingConnection(ConnectionDrag {
                source: node_id.to_string(),
                source_handle,
                cursor: point,
            });
            return InteractionOutcome::ConnectionStarted;
        }

        let Some(input) = handle.as_target() else {
            return InteractionOutcome::None;
        };
        let Some(edge_id) = store.incoming_edge_at(node_id, input).map(|e| e.id.clone()) else {
            log::debug!("No edge arrives at {:?} of '{}' to rewire", input, node_id);
            return InteractionOutcome::None;
        };
        let Some((source, source_handle)) = store.reconnect_edge_source(&edge_id) else {
            return InteractionOutcome::None;
        };
        self.mode = Mode::DrawingConnection(ConnectionDrag {
            source,
            source_handle,
            cursor: point,
        });
        InteractionOutcome::EdgeRemoved(edge_id)
    }

    pub fn pointer_move(&mut self, store: &mut GraphStore, point: Point) -> InteractionOutcome {
        match &mut self.mode {
            Mode::Idle => InteractionOutcome::None,
            Mode::DraggingNode {
                node_id,
                grab_offset,
                ..
            } => {
                let target = point - *grab_offset;
                if store.update_node_position(node_id, target.x, target.y) {
                    InteractionOutcome::Moved
                } else {
                    InteractionOutcome::None
                }
            }
            Mode::DrawingConnection(drag) => {
                drag.cursor = point;
                InteractionOutcome::Moved
            }
        }
    }

    /// Finish the current gesture; always returns to `Idle`
    pub fn pointer_up(&mut self, store: &mut GraphStore, target: &PointerTarget) -> InteractionOutcome {
        match std::mem::take(&mut self.mode) {
            Mode::Idle => InteractionOutcome::None,
            Mode::DraggingNode {
                node_id, origin, ..
            } => {
                let moved = store.node(&node_id).is_some_and(|n| n.position != origin);
                if moved {
                    InteractionOutcome::DragFinished(node_id)
                } else {
                    InteractionOutcome::None
                }
            }
            Mode::DrawingConnection(drag) => {
                let landed = match target {
                    PointerTarget::Handle { node_id, handle } => {
                        handle.as_target().map(|input| (node_id, input))
                    }
                    _ => None,
                };
                let Some((node_id, input)) = landed else {
                    return InteractionOutcome::Cancelled;
                };
                match store.add_edge(&drag.source, node_id, drag.source_handle, input) {
                    Some(edge_id) => InteractionOutcome::EdgeAdded(edge_id),
                    None => InteractionOutcome::Cancelled,
                }
            }
        }
    }

    pub fn key_down(&mut self, store: &mut GraphStore, key: Key) -> InteractionOutcome {
        match key {
            Key::Delete | Key::Backspace => {
                if self.editing.is_some() {
                    return InteractionOutcome::None;
                }
                match store.selection().clone() {
                    Selection::Node(id) => {
                        if !store.delete_node(&id) {
                            return InteractionOutcome::None;
                        }
                        if self.touches_node(&id) {
                            self.mode = Mode::Idle;
                        }
                        InteractionOutcome::NodeRemoved(id)
                    }
                    Selection::Edge(id) => {
                        if store.delete_edge(&id) {
                            InteractionOutcome::EdgeRemoved(id)
                        } else {
                            InteractionOutcome::None
                        }
                    }
                    Selection::None => InteractionOutcome::None,
                }
            }
            Key::Escape => self.cancel(store),
            Key::Other => InteractionOutcome::None,
        }
    }

    /// Escape: drop a pending connection, put a dragged node back where it
    /// started, or else close the property editor
    fn cancel(&mut self, store: &mut GraphStore) -> InteractionOutcome {
        match std::mem::take(&mut self.mode) {
            Mode::DrawingConnection(_) => InteractionOutcome::Cancelled,
            Mode::DraggingNode {
                node_id, origin, ..
            } => {
                store.update_node_position(&node_id, origin.x, origin.y);
                InteractionOutcome::Cancelled
            }
            Mode::Idle => self.close_editor(),
        }
    }

    fn touches_node(&self, id: &str) -> bool {
        match &self.mode {
            Mode::Idle => false,
            Mode::DraggingNode { node_id, .. } => node_id == id,
            Mode::DrawingConnection(drag) => drag.source == id,
        }
    }

    /// Open the property editor for a node
    pub fn double_click(&mut self, store: &GraphStore, node_id: &str) -> InteractionOutcome {
        if store.node(node_id).is_none() {
            return InteractionOutcome::None;
        }
        self.mode = Mode::Idle;
        self.editing = Some(node_id.to_string());
        InteractionOutcome::EditorOpened(node_id.to_string())
    }

    pub fn close_editor(&mut self) -> InteractionOutcome {
        match self.editing.take() {
            Some(_) => InteractionOutcome::EditorClosed,
            None => InteractionOutcome::None,
        }
    }

    /// Temporary curve for the connection being drawn
    pub fn pending_path(&self, store: &GraphStore, config: &CanvasConfig) -> Option<CubicPath> {
        let drag = self.connection()?;
        let source = store.node(&drag.source)?;
        Some(geometry::pending_path(
            source.position,
            drag.source_handle,
            drag.cursor,
            config,
        ))
    }

    /// Forget all transient state, e.g. after the store was reloaded
    pub fn reset(&mut self) {
        self.mode = Mode::Idle;
        self.editing = None;
    }
}

/// Resolve a canvas point to the element under it
///
/// Nodes are above edges. Within a node, its ports are above its body, and
/// a later node covers an earlier one including its ports.
pub fn pick(store: &GraphStore, config: &CanvasConfig, point: Point) -> PointerTarget {
    for node in store.nodes().iter().rev() {
        let port = geometry::visible_handles(store, node)
            .into_iter()
            .find(|h| geometry::anchor(node.position, *h, config).distance(point) <= config.handle_radius);
        if let Some(handle) = port {
            return PointerTarget::handle(node.id.clone(), handle);
        }
        if point.x >= node.position.x
            && point.x <= node.position.x + config.node_width
            && point.y >= node.position.y
            && point.y <= node.position.y + config.node_height
        {
            return PointerTarget::node(node.id.clone());
        }
    }
    if let Some(edge_id) = geometry::delete_button_at(store, config, point) {
        return PointerTarget::DeleteButton { edge_id };
    }
    match geometry::hit_test_edge(store, config, point) {
        Some(edge_id) => PointerTarget::Edge { edge_id },
        None => PointerTarget::Background,
    }
}
