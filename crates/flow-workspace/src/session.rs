//! Editor session
//!
//! One open project: the graph store, gesture state, dataset catalog, undo
//! history and simulation console, wired to the collaborators that load and
//! save the project, list datasets and run the training simulator.
//!
//! Canvas input arrives as points. The session picks the element under the
//! point, forwards the gesture to the interaction state machine and then
//! records an undo step and raises an event for whatever changed.

use std::sync::Arc;

use flow_engine::geometry::{self, RoutedEdge};
use flow_engine::{
    pick, validate_pipeline, CubicPath, DatasetCatalog, EditorEvent, EventSink, FlowError, FlowGraph,
    GraphStore, Interaction, InteractionOutcome, Key, NodeId, NodeKind, NullEventSink, Palette, PanelEdit,
    PanelView, Point, PointerTarget, ProjectSnapshot, PropertyPanel, ResolvedView, SimulationLog,
    SimulationPrompt, UndoStack,
};
use tokio::task::JoinHandle;

use crate::backend::{DatasetSource, ProjectStore, TextGenerator};
use crate::config::WorkspaceConfig;
use crate::error::Result;

/// The collaborators a session talks to
#[derive(Clone)]
pub struct Collaborators {
    pub projects: Arc<dyn ProjectStore>,
    pub datasets: Arc<dyn DatasetSource>,
    pub generator: Arc<dyn TextGenerator>,
}

pub struct EditorSession {
    project_id: String,
    store: GraphStore,
    interaction: Interaction,
    catalog: DatasetCatalog,
    history: UndoStack,
    log: SimulationLog,
    backends: Collaborators,
    events: Arc<dyn EventSink>,
    /// A rewire lifted its edge at pointer down; one undo step is recorded
    /// when the gesture ends
    rewire_pending: bool,
}

impl EditorSession {
    /// Start a session on an empty canvas; call [`open`](Self::open) to load
    /// the saved project
    pub fn new(project_id: impl Into<String>, config: &WorkspaceConfig, backends: Collaborators) -> Self {
        let mut session = Self {
            project_id: project_id.into(),
            store: GraphStore::with_config(config.canvas),
            interaction: Interaction::new(),
            catalog: DatasetCatalog::default(),
            history: UndoStack::new(config.history_depth),
            log: SimulationLog::new(),
            backends,
            events: Arc::new(NullEventSink),
            rewire_pending: false,
        };
        session.record();
        session
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn log(&self) -> &SimulationLog {
        &self.log
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Load the saved project, replacing the canvas and console
    ///
    /// Missing or malformed content leaves an empty canvas. Only a failing
    /// collaborator is reported as an error, and then nothing changes.
    pub async fn open(&mut self) -> Result<()> {
        let content = self.backends.projects.load_project(&self.project_id).await?;
        let snapshot = content
            .as_deref()
            .and_then(ProjectSnapshot::decode_lenient)
            .unwrap_or_default();

        let (graph, log) = snapshot.into_parts();
        self.replace_graph(graph);
        self.log = SimulationLog::from_text(log);
        self.history.clear();
        self.record();
        self.emit(EditorEvent::LogUpdated {
            log: self.log.as_str().to_string(),
        });
        log::info!(
            "Opened project '{}' with {} node(s)",
            self.project_id,
            self.store.nodes().len()
        );
        Ok(())
    }

    /// Replace the dataset catalog with the student's current datasets
    pub async fn refresh_catalog(&mut self, student_id: &str) -> Result<usize> {
        let records = self.backends.datasets.list_datasets(student_id).await?;
        self.catalog = DatasetCatalog::new(records);
        Ok(self.catalog.len())
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot::capture(&self.store, self.log.as_str())
    }

    /// Save the whole project and wait for the answer
    pub async fn save(&self) -> Result<()> {
        self.backends
            .projects
            .save_project(&self.project_id, &self.snapshot())
            .await?;
        self.emit(EditorEvent::ProjectSaved {
            project_id: self.project_id.clone(),
        });
        Ok(())
    }

    /// Save in the background while editing continues
    ///
    /// The snapshot is taken now. Overlapping saves are neither queued nor
    /// coalesced, so the last one to finish wins.
    pub fn save_detached(&self) -> JoinHandle<Result<()>> {
        let projects = Arc::clone(&self.backends.projects);
        let events = Arc::clone(&self.events);
        let project_id = self.project_id.clone();
        let snapshot = self.snapshot();

        tokio::spawn(async move {
            let result = projects.save_project(&project_id, &snapshot).await;
            match &result {
                Ok(()) => {
                    if let Err(e) = events.send(EditorEvent::ProjectSaved { project_id }) {
                        log::warn!("Dropped editor event: {}", e);
                    }
                }
                Err(e) => log::error!("Saving project '{}' failed: {}", project_id, e),
            }
            result
        })
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Send the pipeline to the training simulator and append its answer
    ///
    /// An empty canvas is refused before anything is written to the
    /// console. A failing generator is reported in the console, not as an
    /// error.
    pub async fn run_simulation(&mut self) -> Result<()> {
        if self.store.is_empty() {
            log::info!("{}", flow_engine::simulation::EMPTY_PIPELINE_MESSAGE);
            return Err(FlowError::EmptyPipeline.into());
        }

        let graph = self.store.snapshot();
        for finding in validate_pipeline(&graph) {
            log::warn!("Pipeline check: {}", finding);
        }

        self.log.begin();
        self.emit_log();

        match SimulationPrompt::build(&graph) {
            Ok(prompt) => {
                let answer = match self.backends.generator.generate(&prompt).await {
                    Ok(text) => SimulationPrompt::answer_text(Some(text)),
                    Err(e) => {
                        log::error!("Simulation failed: {}", e);
                        flow_engine::simulation::GENERATOR_ERROR_TEXT.to_string()
                    }
                };
                self.log.append_result(&answer);
            }
            Err(e) => {
                log::error!("Could not build simulation prompt: {}", e);
                self.log.append_failure();
            }
        }
        self.emit_log();
        Ok(())
    }

    // ========================================================================
    // Canvas input
    // ========================================================================

    pub fn target_at(&self, point: Point) -> PointerTarget {
        pick(&self.store, self.store.config(), point)
    }

    pub fn pointer_down(&mut self, point: Point) -> InteractionOutcome {
        let target = self.target_at(point);
        let outcome = self.interaction.pointer_down(&mut self.store, &target, point);
        self.settle(outcome)
    }

    pub fn pointer_move(&mut self, point: Point) -> InteractionOutcome {
        let outcome = self.interaction.pointer_move(&mut self.store, point);
        self.settle(outcome)
    }

    pub fn pointer_up(&mut self, point: Point) -> InteractionOutcome {
        let target = self.target_at(point);
        let outcome = self.interaction.pointer_up(&mut self.store, &target);
        self.settle(outcome)
    }

    pub fn key_down(&mut self, key: Key) -> InteractionOutcome {
        let outcome = self.interaction.key_down(&mut self.store, key);
        self.settle(outcome)
    }

    /// Open the property editor of the node under the point
    pub fn double_click(&mut self, point: Point) -> InteractionOutcome {
        let outcome = match self.target_at(point) {
            PointerTarget::NodeBody { node_id } | PointerTarget::Handle { node_id, .. } => {
                self.interaction.double_click(&self.store, &node_id)
            }
            _ => InteractionOutcome::None,
        };
        self.settle(outcome)
    }

    /// Close the property editor, storing suggested columns on a
    /// preprocess node first
    pub fn close_editor(&mut self) -> InteractionOutcome {
        if let Some(node_id) = self.interaction.editing_id().map(str::to_string) {
            if PropertyPanel::new(&self.catalog).commit_suggested_columns(&mut self.store, &node_id) {
                self.node_updated(node_id);
            }
        }
        let outcome = self.interaction.close_editor();
        self.settle(outcome)
    }

    /// Edges ready to draw, plus the curve of a connection being dragged
    pub fn routed_edges(&self) -> (Vec<RoutedEdge>, Option<CubicPath>) {
        let config = self.store.config();
        (
            geometry::route_edges(&self.store, config),
            self.interaction.pending_path(&self.store, config),
        )
    }

    // ========================================================================
    // Nodes and panels
    // ========================================================================

    /// Create a node from a palette pick
    pub fn add_from_palette(&mut self, kind: NodeKind, group: Option<&str>, child: Option<&str>) -> Option<NodeId> {
        let template = Palette::builtin().select(kind, group, child)?;
        let node_id = template.add_to(&mut self.store).id.clone();
        self.record();
        self.emit(EditorEvent::NodeAdded {
            node_id: node_id.clone(),
        });
        Some(node_id)
    }

    pub fn panel(&self, node_id: &str) -> Option<PanelView> {
        PropertyPanel::new(&self.catalog).for_node(&self.store, node_id)
    }

    /// Panel of the node whose editor is open, read fresh from the store
    pub fn editor_panel(&self) -> Option<PanelView> {
        self.panel(self.interaction.editing_id()?)
    }

    pub fn edit_node(&mut self, node_id: &str, edit: PanelEdit) -> bool {
        let changed = PropertyPanel::new(&self.catalog).apply_edit(&mut self.store, node_id, edit);
        if changed {
            self.node_updated(node_id.to_string());
        }
        changed
    }

    /// The dataset reaching a node, if any
    pub fn resolve(&self, node_id: &str) -> Option<ResolvedView> {
        flow_engine::Resolver::new(&self.store, &self.catalog).resolve(node_id)
    }

    /// Clear the canvas and the console
    pub fn reset_canvas(&mut self) {
        self.replace_graph(FlowGraph::new());
        self.log.clear();
        self.record();
        self.emit_log();
    }

    // ========================================================================
    // History
    // ========================================================================

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one recorded change; false when there is none
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo() {
            Some(graph) => {
                self.replace_graph(graph?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo() {
            Some(graph) => {
                self.replace_graph(graph?);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn settle(&mut self, outcome: InteractionOutcome) -> InteractionOutcome {
        let drawing = self.interaction.connection().is_some();
        if self.rewire_pending && !drawing {
            self.rewire_pending = false;
            self.record();
        } else if outcome.is_structural() {
            if drawing {
                self.rewire_pending = true;
            } else {
                self.record();
            }
        }
        if let Some(event) = EditorEvent::from_outcome(&outcome) {
            self.emit(event);
        }
        outcome
    }

    fn node_updated(&mut self, node_id: NodeId) {
        self.record();
        self.emit(EditorEvent::NodeUpdated { node_id });
    }

    fn replace_graph(&mut self, graph: FlowGraph) {
        self.store.load(graph);
        self.interaction.reset();
        self.rewire_pending = false;
        self.emit(EditorEvent::GraphReplaced {
            node_count: self.store.nodes().len(),
            edge_count: self.store.edges().len(),
        });
    }

    /// Push the current graph onto the undo history
    fn record(&mut self) {
        if let Err(e) = self.history.push(&self.store.snapshot()) {
            log::warn!("Could not record undo step: {}", e);
        }
    }

    fn emit_log(&self) {
        self.emit(EditorEvent::LogUpdated {
            log: self.log.as_str().to_string(),
        });
    }

    fn emit(&self, event: EditorEvent) {
        if let Err(e) = self.events.send(event) {
            log::debug!("Dropped editor event: {}", e);
        }
    }
}
