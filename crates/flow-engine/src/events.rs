//! Editor change notifications
//!
//! The engine keeps no renderer. A host that draws the canvas subscribes
//! through an [`EventSink`] and redraws whatever an event invalidates.

use serde::{Deserialize, Serialize};

use crate::interaction::InteractionOutcome;
use crate::types::{EdgeId, NodeId};

/// Receiver of editor events
///
/// Abstracts the transport (UI channel, mpsc, test buffer) so the session
/// can run in different hosts.
pub trait EventSink: Send + Sync {
    /// Deliver an event; fails when the receiver is gone
    fn send(&self, event: EditorEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone)]
pub struct EventError {
    pub message: String,
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event error: {}", self.message)
    }
}

impl std::error::Error for EventError {}

impl EventError {
    pub fn channel_closed() -> Self {
        Self {
            message: "Channel closed".to_string(),
        }
    }
}

/// Something in the editor changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    #[serde(rename_all = "camelCase")]
    NodeAdded { node_id: NodeId },

    #[serde(rename_all = "camelCase")]
    NodeRemoved { node_id: NodeId },

    /// A drag finished; intermediate moves are not reported
    #[serde(rename_all = "camelCase")]
    NodeMoved { node_id: NodeId },

    /// Node parameters changed through the property panel
    #[serde(rename_all = "camelCase")]
    NodeUpdated { node_id: NodeId },

    #[serde(rename_all = "camelCase")]
    EdgeAdded { edge_id: EdgeId },

    #[serde(rename_all = "camelCase")]
    EdgeRemoved { edge_id: EdgeId },

    /// The whole graph was swapped (project load, undo, redo, reset)
    #[serde(rename_all = "camelCase")]
    GraphReplaced { node_count: usize, edge_count: usize },

    SelectionChanged,

    #[serde(rename_all = "camelCase")]
    EditorOpened { node_id: NodeId },

    EditorClosed,

    /// The simulation console text changed
    LogUpdated { log: String },

    #[serde(rename_all = "camelCase")]
    ProjectSaved { project_id: String },
}

impl EditorEvent {
    /// The event a gesture outcome should raise, if any
    pub fn from_outcome(outcome: &InteractionOutcome) -> Option<Self> {
        let event = match outcome {
            InteractionOutcome::DragFinished(id) => Self::NodeMoved {
                node_id: id.clone(),
            },
            InteractionOutcome::EdgeAdded(id) => Self::EdgeAdded {
                edge_id: id.clone(),
            },
            InteractionOutcome::EdgeRemoved(id) => Self::EdgeRemoved {
                edge_id: id.clone(),
            },
            InteractionOutcome::NodeRemoved(id) => Self::NodeRemoved {
                node_id: id.clone(),
            },
            InteractionOutcome::EditorOpened(id) => Self::EditorOpened {
                node_id: id.clone(),
            },
            InteractionOutcome::EditorClosed => Self::EditorClosed,
            InteractionOutcome::Selected => Self::SelectionChanged,
            InteractionOutcome::None
            | InteractionOutcome::Moved
            | InteractionOutcome::ConnectionStarted
            | InteractionOutcome::Cancelled => return None,
        };
        Some(event)
    }
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: EditorEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<EditorEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: EditorEvent) -> Result<(), EventError> {
        let mut events = self.events.lock().map_err(|_| EventError {
            message: "Event buffer poisoned".to_string(),
        })?;
        events.push(event);
        Ok(())
    }
}
