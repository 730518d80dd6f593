//! Canvas configuration shared by geometry, hit-testing and node placement

use serde::{Deserialize, Serialize};

/// Default canvas constants
pub mod defaults {
    /// Node footprint width in canvas units
    pub const NODE_WIDTH: f64 = 240.0;
    /// Node footprint height in canvas units
    pub const NODE_HEIGHT: f64 = 100.0;
    /// Control point displacement for edge curves
    pub const CURVATURE: f64 = 60.0;
    /// Width of the invisible stroke used for edge hit-testing
    pub const EDGE_HIT_WIDTH: f64 = 15.0;
    /// Width of the visible edge stroke
    pub const EDGE_STROKE_WIDTH: f64 = 3.0;
    /// Radius of a port handle's hit circle
    pub const HANDLE_RADIUS: f64 = 12.0;
    /// Radius of the delete button drawn on a selected edge
    pub const DELETE_BUTTON_RADIUS: f64 = 10.0;
    /// Top-left of the first node added to an empty canvas
    pub const NEW_NODE_ORIGIN: (f64, f64) = (100.0, 100.0);
    /// Diagonal offset applied per existing node when placing a new one
    pub const NEW_NODE_STAGGER: f64 = 20.0;
}

/// Geometry constants for the editor canvas
///
/// One instance is shared by edge routing and hit-testing so the two stay
/// numerically consistent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub curvature: f64,
    pub edge_hit_width: f64,
    pub edge_stroke_width: f64,
    pub handle_radius: f64,
    pub delete_button_radius: f64,
    pub new_node_origin: (f64, f64),
    pub new_node_stagger: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            node_width: defaults::NODE_WIDTH,
            node_height: defaults::NODE_HEIGHT,
            curvature: defaults::CURVATURE,
            edge_hit_width: defaults::EDGE_HIT_WIDTH,
            edge_stroke_width: defaults::EDGE_STROKE_WIDTH,
            handle_radius: defaults::HANDLE_RADIUS,
            delete_button_radius: defaults::DELETE_BUTTON_RADIUS,
            new_node_origin: defaults::NEW_NODE_ORIGIN,
            new_node_stagger: defaults::NEW_NODE_STAGGER,
        }
    }
}
