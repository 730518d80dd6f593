//! Structural checks on a pipeline graph
//!
//! The store already refuses self loops and duplicate connections, but
//! graphs also arrive from saved projects and builders. Validation reports
//! every problem found; it never blocks a simulation run, the findings are
//! only written to the console.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::types::FlowGraph;

/// A structural problem in a pipeline graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Following edges from some node leads back to it
    CycleDetected,
    /// An edge references a node that does not exist
    UnknownNode { edge_id: String, node_id: String },
    /// An edge connects a node to itself
    SelfLoop { edge_id: String },
    /// More than one edge connects the same ordered pair
    DuplicateConnection {
        edge_id: String,
        source: String,
        target: String,
    },
    /// A node that reads a single input has several incoming edges; only
    /// the first one is used when resolving data
    MultipleInputs { node_id: String, count: usize },
}

impl ValidationError {
    /// Soft findings describe a graph that still resolves
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MultipleInputs { .. })
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected => write!(f, "Cycle detected in pipeline"),
            Self::UnknownNode { edge_id, node_id } => {
                write!(f, "Edge '{}' references unknown node '{}'", edge_id, node_id)
            }
            Self::SelfLoop { edge_id } => write!(f, "Edge '{}' connects a node to itself", edge_id),
            Self::DuplicateConnection {
                edge_id,
                source,
                target,
            } => write!(
                f,
                "Edge '{}' duplicates the connection {} -> {}",
                edge_id, source, target
            ),
            Self::MultipleInputs { node_id, count } => write!(
                f,
                "Node '{}' has {} inputs; only the first is used",
                node_id, count
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a pipeline graph, returning every finding
pub fn validate_pipeline(graph: &FlowGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_edge_references(graph, &mut errors);
    validate_connections(graph, &mut errors);
    validate_input_counts(graph, &mut errors);
    detect_cycles(graph, &mut errors);

    errors
}

fn validate_edge_references(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let node_ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &graph.edges {
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                errors.push(ValidationError::UnknownNode {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
    }
}

fn validate_connections(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for edge in &graph.edges {
        if edge.source == edge.target {
            errors.push(ValidationError::SelfLoop {
                edge_id: edge.id.clone(),
            });
            continue;
        }
        if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
            errors.push(ValidationError::DuplicateConnection {
                edge_id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
            });
        }
    }
}

fn validate_input_counts(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    for node in graph.nodes.iter().filter(|n| !n.accepts_multiple_inputs()) {
        let count = graph.incoming_edges(&node.id).count();
        if count > 1 {
            errors.push(ValidationError::MultipleInputs {
                node_id: node.id.clone(),
                count,
            });
        }
    }
}

/// Kahn's algorithm over the edges between known nodes
///
/// Self loops are left out; they are already reported on their own.
fn detect_cycles(graph: &FlowGraph, errors: &mut Vec<ValidationError>) {
    let mut in_degree: HashMap<&str, usize> =
        graph.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let edges: Vec<(&str, &str)> = graph
        .edges
        .iter()
        .filter(|e| {
            e.source != e.target
                && in_degree.contains_key(e.source.as_str())
                && in_degree.contains_key(e.target.as_str())
        })
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    for (_, target) in &edges {
        if let Some(deg) = in_degree.get_mut(target) {
            *deg += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(node_id) = queue.pop_front() {
        visited += 1;
        for (_, target) in edges.iter().filter(|(source, _)| *source == node_id) {
            if let Some(deg) = in_degree.get_mut(target) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(*target);
                }
            }
        }
    }

    if visited < in_degree.len() {
        errors.push(ValidationError::CycleDetected);
    }
}
