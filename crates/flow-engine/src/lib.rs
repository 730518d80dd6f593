//! Flow Engine - editor core for Flow Lab machine-learning pipelines
//!
//! Students compose a pipeline on a canvas out of dataset, preprocessing,
//! model, training and evaluation steps. This crate is everything behind
//! that canvas except the drawing itself:
//!
//! - `GraphStore`: nodes, edges and selection, with all mutation rules
//! - Geometry: port anchors, cubic edge paths and hit-testing
//! - `Interaction`: the pointer/keyboard gesture state machine
//! - `Resolver`: the dataset that reaches a node through upstream steps
//! - Column type inference for preprocessing suggestions
//! - `UndoStack`: compressed whole-graph snapshots
//!
//! Nothing here is async and nothing performs I/O; project storage, the
//! dataset catalog and the training simulator live behind traits in the
//! `flow-workspace` crate.
//!
//! # Example
//!
//! ```ignore
//! use flow_engine::{DatasetCatalog, GraphStore, NodeKind, Resolver};
//!
//! let mut store = GraphStore::new();
//! let data = store.add_node(NodeKind::Dataset, "Dataset", Some("dataset_load"), None).id.clone();
//! let view = store.add_node(NodeKind::Dataset, "Viewer", Some("data_viewer"), None).id.clone();
//! store.add_edge(&data, &view, Default::default(), Default::default());
//!
//! let catalog = DatasetCatalog::default();
//! let resolved = Resolver::new(&store, &catalog).resolve(&view);
//! ```

pub mod builder;
pub mod config;
pub mod dataset;
pub mod error;
pub mod events;
pub mod geometry;
pub mod infer;
pub mod interaction;
pub mod palette;
pub mod panel;
pub mod resolve;
pub mod simulation;
pub mod snapshot;
pub mod store;
pub mod types;
pub mod undo;
pub mod validation;

// Re-export key types
pub use builder::GraphBuilder;
pub use config::CanvasConfig;
pub use dataset::{ResolvedView, Splits, Table};
pub use error::{FlowError, Result};
pub use events::{EditorEvent, EventError, EventSink, NullEventSink, VecEventSink};
pub use geometry::{CubicPath, RoutedEdge};
pub use infer::{infer_column_types, suggest_columns, ColumnScope, ColumnTypes};
pub use interaction::{pick, Interaction, InteractionOutcome, Key, Mode, PointerTarget};
pub use palette::{NodeTemplate, Palette, PaletteEntry};
pub use panel::{PanelBody, PanelEdit, PanelView, PropertyPanel};
pub use resolve::{DatasetCatalog, DatasetRecord, Resolver};
pub use simulation::{SimulationLog, SimulationPrompt};
pub use snapshot::ProjectSnapshot;
pub use store::{GraphStore, Selection};
pub use types::{
    DatasetStep, EdgeId, FlowEdge, FlowGraph, FlowNode, Handle, NodeData, NodeId, NodeKind, NodePatch, Point,
    PreprocessMethod, SourceHandle, TargetHandle,
};
pub use undo::UndoStack;
pub use validation::{validate_pipeline, ValidationError};
