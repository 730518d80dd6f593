//! Edge routing and hit-testing
//!
//! Port anchors, cubic edge curves and the temporary connection curve are
//! all computed from one `CanvasConfig`, so what is drawn and what is
//! clickable always agree.

use serde::{Deserialize, Serialize};

use crate::config::CanvasConfig;
use crate::store::GraphStore;
use crate::types::{
    DatasetStep, EdgeId, FlowNode, Handle, NodeData, NodeId, Point, SourceHandle, TargetHandle,
};

/// Number of straight segments used to approximate a curve for hit-testing
const HIT_SAMPLES: usize = 48;

/// Absolute canvas position of a port on a node whose top-left is `position`
pub fn anchor(position: Point, handle: Handle, config: &CanvasConfig) -> Point {
    let (w, h) = (config.node_width, config.node_height);
    match handle {
        Handle::Right => Point::new(position.x + w, position.y + h / 2.0),
        Handle::Bottom => Point::new(position.x + w / 2.0, position.y + h),
        Handle::Left => Point::new(position.x, position.y + h / 2.0),
        Handle::Top => Point::new(position.x + w / 2.0, position.y),
    }
}

/// Direction a curve leaves an output port
fn outward(handle: SourceHandle) -> Point {
    match handle {
        SourceHandle::Right => Point::new(1.0, 0.0),
        SourceHandle::Bottom => Point::new(0.0, 1.0),
    }
}

/// Direction a curve enters an input port, pointing away from the node
fn inward(handle: TargetHandle) -> Point {
    match handle {
        TargetHandle::Left => Point::new(-1.0, 0.0),
        TargetHandle::Top => Point::new(0.0, -1.0),
    }
}

fn scaled(direction: Point, length: f64) -> Point {
    Point::new(direction.x * length, direction.y * length)
}

/// A cubic Bézier curve in canvas space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicPath {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl CubicPath {
    /// Point on the curve at parameter `t` in [0, 1]
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }

    /// Linear midpoint of the endpoints, where the delete button sits
    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.start.x + self.end.x) / 2.0,
            (self.start.y + self.end.y) / 2.0,
        )
    }

    /// SVG path data (`M sx,sy C c1x,c1y c2x,c2y ex,ey`)
    pub fn to_svg(&self) -> String {
        format!(
            "M{},{} C{},{} {},{} {},{}",
            self.start.x,
            self.start.y,
            self.control1.x,
            self.control1.y,
            self.control2.x,
            self.control2.y,
            self.end.x,
            self.end.y
        )
    }

    /// Approximate shortest distance from `point` to the curve
    pub fn distance_to(&self, point: Point) -> f64 {
        let mut best = f64::INFINITY;
        let mut prev = self.start;
        for i in 1..=HIT_SAMPLES {
            let next = self.point_at(i as f64 / HIT_SAMPLES as f64);
            best = best.min(distance_to_segment(point, prev, next));
            prev = next;
        }
        best
    }

    /// Whether `point` falls inside a stroke of `width` centred on the curve
    pub fn hit(&self, point: Point, width: f64) -> bool {
        self.distance_to(point) <= width / 2.0
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + scaled(ab, t))
}

/// Curve between two connected ports
///
/// Control points leave the source perpendicular to its boundary and enter
/// the target perpendicular to its boundary, whatever the relative node
/// positions.
pub fn edge_path(
    source_pos: Point,
    source_handle: SourceHandle,
    target_pos: Point,
    target_handle: TargetHandle,
    config: &CanvasConfig,
) -> CubicPath {
    let start = anchor(source_pos, source_handle.into(), config);
    let end = anchor(target_pos, target_handle.into(), config);
    CubicPath {
        start,
        control1: start + scaled(outward(source_handle), config.curvature),
        control2: end + scaled(inward(target_handle), config.curvature),
        end,
    }
}

/// Curve from an output port to the live cursor while a connection is drawn
///
/// The cursor end bends back toward the source along whichever axis
/// dominates the displacement, as if it were seeking a port.
pub fn pending_path(
    source_pos: Point,
    source_handle: SourceHandle,
    cursor: Point,
    config: &CanvasConfig,
) -> CubicPath {
    let start = anchor(source_pos, source_handle.into(), config);
    let c = config.curvature;
    let control2 = if (cursor.x - start.x).abs() > (cursor.y - start.y).abs() {
        let dx = if cursor.x > start.x { -c } else { c };
        Point::new(cursor.x + dx, cursor.y)
    } else {
        let dy = if cursor.y > start.y { -c } else { c };
        Point::new(cursor.x, cursor.y + dy)
    };
    CubicPath {
        start,
        control1: start + scaled(outward(source_handle), c),
        control2,
        end: cursor,
    }
}

/// An edge ready to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    pub id: EdgeId,
    pub path: CubicPath,
    pub selected: bool,
}

/// Route every edge whose endpoints both exist, in storage order
pub fn route_edges(store: &GraphStore, config: &CanvasConfig) -> Vec<RoutedEdge> {
    store
        .edges()
        .iter()
        .filter_map(|edge| {
            let source = store.node(&edge.source)?;
            let target = store.node(&edge.target)?;
            Some(RoutedEdge {
                id: edge.id.clone(),
                path: edge_path(
                    source.position,
                    edge.source_handle,
                    target.position,
                    edge.target_handle,
                    config,
                ),
                selected: store.selection().edge_id() == Some(edge.id.as_str()),
            })
        })
        .collect()
}

/// Topmost edge whose hit region contains `point`
///
/// Only a direct hit counts; a near miss selects nothing.
pub fn hit_test_edge(store: &GraphStore, config: &CanvasConfig, point: Point) -> Option<EdgeId> {
    route_edges(store, config)
        .into_iter()
        .rev()
        .find(|routed| routed.path.hit(point, config.edge_hit_width))
        .map(|routed| routed.id)
}

/// Whether the selected edge's delete button is under `point`
pub fn delete_button_at(store: &GraphStore, config: &CanvasConfig, point: Point) -> Option<EdgeId> {
    route_edges(store, config)
        .into_iter()
        .find(|routed| {
            routed.selected && routed.path.midpoint().distance(point) <= config.delete_button_radius
        })
        .map(|routed| routed.id)
}

fn contains(node: &FlowNode, config: &CanvasConfig, point: Point) -> bool {
    point.x >= node.position.x
        && point.x <= node.position.x + config.node_width
        && point.y >= node.position.y
        && point.y <= node.position.y + config.node_height
}

/// Topmost node whose footprint contains `point`
pub fn node_at<'a>(store: &'a GraphStore, config: &CanvasConfig, point: Point) -> Option<&'a FlowNode> {
    store
        .nodes()
        .iter()
        .rev()
        .find(|node| contains(node, config, point))
}

/// Ports drawn on a node
///
/// A connected data viewer only shows the input port its edge arrives at.
pub fn visible_handles(store: &GraphStore, node: &FlowNode) -> Vec<Handle> {
    let viewer = matches!(node.data, NodeData::Dataset(DatasetStep::DataViewer));
    let incoming: Vec<TargetHandle> = store.incoming_edges(&node.id).map(|e| e.target_handle).collect();

    Handle::ALL
        .into_iter()
        .filter(|handle| match handle.as_target() {
            Some(input) if viewer && !incoming.is_empty() => incoming.contains(&input),
            _ => true,
        })
        .collect()
}

/// Topmost visible port whose hit circle contains `point`
pub fn handle_at(store: &GraphStore, config: &CanvasConfig, point: Point) -> Option<(NodeId, Handle)> {
    store.nodes().iter().rev().find_map(|node| {
        visible_handles(store, node)
            .into_iter()
            .find(|h| anchor(node.position, *h, config).distance(point) <= config.handle_radius)
            .map(|h| (node.id.clone(), h))
    })
}
