//! End-to-end editor scenarios driven through the public API

use flow_engine::geometry;
use flow_engine::{
    pick, DatasetCatalog, DatasetRecord, GraphBuilder, GraphStore, Handle, Interaction, InteractionOutcome, Key, NodeKind,
    NodePatch, PanelEdit, PointerTarget, ProjectSnapshot, PropertyPanel, Resolver, SourceHandle, TargetHandle,
    UndoStack,
};
use serde_json::json;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn record(id: &str, content: serde_json::Value) -> DatasetRecord {
    serde_json::from_value(json!({
        "id": id,
        "owner_id": "student-1",
        "name": id,
        "type": "tabular",
        "content": content.to_string(),
        "is_public": 0,
        "created_at": "2025-03-01T09:00:00Z"
    }))
    .unwrap()
}

fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

fn add_loader(store: &mut GraphStore, dataset_id: &str) -> String {
    let id = store
        .add_node(NodeKind::Dataset, "Dataset (Dataset Load)", Some("dataset_load"), None)
        .id
        .clone();
    assert!(store.update_node_data(&id, &NodePatch::dataset(dataset_id, None)));
    id
}

/// Drag from `from`'s right port to `to`'s left port using canvas coordinates
fn drag_connect(ui: &mut Interaction, store: &mut GraphStore, from: &str, to: &str) -> InteractionOutcome {
    let config = *store.config();
    let start = geometry::anchor(store.node(from).unwrap().position, Handle::Right, &config);
    let end = geometry::anchor(store.node(to).unwrap().position, Handle::Left, &config);

    let down = pick(store, &config, start);
    assert_eq!(down, PointerTarget::handle(from, Handle::Right));
    ui.pointer_down(store, &down, start);
    ui.pointer_move(store, end);
    let up = pick(store, &config, end);
    ui.pointer_up(store, &up)
}

#[test]
fn test_passthrough_then_column_drop() {
    init_logging();
    let catalog = DatasetCatalog::new(vec![record(
        "ds-1",
        json!({"data": [["a", "b"], ["1", "x"], ["2", "y"]]}),
    )]);
    let mut store = GraphStore::new();
    let mut ui = Interaction::new();

    let load = add_loader(&mut store, "ds-1");
    let prep = store
        .add_node(NodeKind::Preprocess, "데이터 전처리", None, None)
        .id
        .clone();
    // Spread the nodes out so ports do not overlap
    store.update_node_position(&prep, 500.0, 100.0);

    let out = drag_connect(&mut ui, &mut store, &load, &prep);
    assert!(matches!(out, InteractionOutcome::EdgeAdded(_)));

    let resolved = Resolver::new(&store, &catalog).resolve(&prep).unwrap();
    assert_eq!(resolved.data, Some(table(&[&["a", "b"], &["1", "x"], &["2", "y"]])));

    // Insert a column drop between the two
    let drop = store
        .add_node(NodeKind::Dataset, "Dataset (Column Drop)", Some("column_drop"), None)
        .id
        .clone();
    store.update_node_position(&drop, 300.0, 400.0);
    let direct = store.edges()[0].id.clone();
    assert!(store.delete_edge(&direct));
    store
        .add_edge(&load, &drop, SourceHandle::Right, TargetHandle::Left)
        .unwrap();
    store
        .add_edge(&drop, &prep, SourceHandle::Right, TargetHandle::Left)
        .unwrap();

    let panel = PropertyPanel::new(&catalog);
    assert!(panel.apply_edit(&mut store, &drop, PanelEdit::ToggleDropped("b".to_string())));

    let resolved = Resolver::new(&store, &catalog).resolve(&prep).unwrap();
    assert_eq!(resolved.data, Some(table(&[&["a"], &["1"], &["2"]])));
}

#[test]
fn test_concatenate_two_datasets() {
    init_logging();
    let catalog = DatasetCatalog::new(vec![
        record("left", json!({"data": [["a"], ["1"]]})),
        record("right", json!({"data": [["a"], ["2"]]})),
    ]);
    let store = GraphBuilder::new()
        .load("a", "left")
        .load("b", "right")
        .concatenate("merge")
        .with_label("Dataset (Concatenate (Merge))")
        .connect("a", "merge")
        .connect_handles("b", SourceHandle::Bottom, "merge", TargetHandle::Top)
        .into_store();
    assert_eq!(store.edges().len(), 2);

    let resolved = Resolver::new(&store, &catalog).resolve("merge").unwrap();
    assert_eq!(resolved.data, Some(table(&[&["a"], &["1"], &["2"]])));
    assert!(resolved.splits.is_none());
}

#[test]
fn test_edge_uniqueness_and_self_loops() {
    let mut store = GraphStore::new();
    let ids: Vec<String> = (0..4)
        .map(|i| store.add_node(NodeKind::Model, format!("m{}", i), None, None).id.clone())
        .collect();

    for a in &ids {
        assert!(store.add_edge(a, a, SourceHandle::Right, TargetHandle::Left).is_none());
        for b in &ids {
            store.add_edge(a, b, SourceHandle::Right, TargetHandle::Left);
            store.add_edge(a, b, SourceHandle::Bottom, TargetHandle::Top);
        }
    }

    let mut pairs: Vec<(&str, &str)> = store
        .edges()
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    let total = pairs.len();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), total);
    assert_eq!(total, 12);
    assert!(store.edges().iter().all(|e| e.source != e.target));
}

#[test]
fn test_cascade_delete_via_keyboard() {
    let mut store = GraphStore::new();
    let mut ui = Interaction::new();
    let hub = store.add_node(NodeKind::Training, "hub", None, None).id.clone();
    for i in 0..3 {
        let other = store.add_node(NodeKind::Model, format!("m{}", i), None, None).id.clone();
        store.add_edge(&other, &hub, SourceHandle::Right, TargetHandle::Left);
        store.add_edge(&hub, &other, SourceHandle::Bottom, TargetHandle::Top);
    }
    assert_eq!(store.edges().len(), 6);

    let hub_pos = store.node(&hub).unwrap().position;
    ui.pointer_down(&mut store, &PointerTarget::node(&hub), hub_pos);
    ui.pointer_up(&mut store, &PointerTarget::node(&hub));
    let out = ui.key_down(&mut store, Key::Delete);

    assert_eq!(out, InteractionOutcome::NodeRemoved(hub.clone()));
    assert!(store.edges().iter().all(|e| !e.involves_node(&hub)));
    assert!(store.edges().is_empty());
}

#[test]
fn test_rewire_preserves_source() {
    let mut store = GraphStore::new();
    let mut ui = Interaction::new();
    let a = store.add_node(NodeKind::Dataset, "a", None, None).id.clone();
    let b = store.add_node(NodeKind::Preprocess, "b", None, None).id.clone();
    let c = store.add_node(NodeKind::Model, "c", None, None).id.clone();
    store.add_edge(&a, &b, SourceHandle::Right, TargetHandle::Top).unwrap();

    let grab = ui.pointer_down(&mut store, &PointerTarget::handle(&b, Handle::Top), Default::default());
    assert!(matches!(grab, InteractionOutcome::EdgeRemoved(_)));
    let drop = ui.pointer_up(&mut store, &PointerTarget::handle(&c, Handle::Left));
    assert!(matches!(drop, InteractionOutcome::EdgeAdded(_)));

    assert_eq!(store.edges().len(), 1);
    assert_eq!(store.edges()[0].source, a);
    assert_eq!(store.edges()[0].target, c);
    assert_eq!(store.edges()[0].source_handle, SourceHandle::Right);
    assert!(store.incoming_edge_at(&b, TargetHandle::Top).is_none());
}

#[test]
fn test_column_drop_toggle_idempotent() {
    let catalog = DatasetCatalog::new(vec![record(
        "ds",
        json!({"data": [["x", "y", "z"], ["1", "2", "3"]]}),
    )]);
    let mut store = GraphStore::new();
    let load = add_loader(&mut store, "ds");
    let drop = store
        .add_node(NodeKind::Dataset, "drop", Some("column_drop"), None)
        .id
        .clone();
    store.add_edge(&load, &drop, SourceHandle::Right, TargetHandle::Left).unwrap();
    let view = store
        .add_node(NodeKind::Dataset, "view", Some("data_viewer"), None)
        .id
        .clone();
    store.add_edge(&drop, &view, SourceHandle::Right, TargetHandle::Left).unwrap();

    let panel = PropertyPanel::new(&catalog);
    let header = |store: &GraphStore| {
        Resolver::new(store, &catalog)
            .resolve(&view)
            .and_then(|v| v.header().map(|h| h.to_vec()))
    };

    panel.apply_edit(&mut store, &drop, PanelEdit::ToggleDropped("y".to_string()));
    let once = header(&store);
    panel.apply_edit(&mut store, &drop, PanelEdit::ToggleDropped("y".to_string()));
    panel.apply_edit(&mut store, &drop, PanelEdit::ToggleDropped("y".to_string()));
    assert_eq!(header(&store), once);
    assert_eq!(once, Some(vec!["x".to_string(), "z".to_string()]));
}

#[test]
fn test_concatenation_row_count() {
    let catalog = DatasetCatalog::new(vec![
        record("m", json!({"data": [["h1", "h2"], ["1", "2"], ["3", "4"], ["5", "6"]]})),
        record("n", json!({"data": [["h1", "h2"], ["7", "8"], ["9", "0"]]})),
    ]);
    let store = GraphBuilder::new()
        .load("m", "m")
        .load("n", "n")
        .concatenate("merge")
        .connect("m", "merge")
        .connect("n", "merge")
        .into_store();

    let merged = Resolver::new(&store, &catalog).resolve("merge").unwrap();
    assert_eq!(merged.data.unwrap().len(), 1 + 3 + 2);
}

#[test]
fn test_cycle_resolves_to_none() {
    init_logging();
    let catalog = DatasetCatalog::default();
    let store = GraphBuilder::new()
        .add_kind("a", NodeKind::Preprocess)
        .add_kind("b", NodeKind::Model)
        .connect("a", "b")
        .connect("b", "a")
        .into_store();
    assert_eq!(store.edges().len(), 2);

    assert!(Resolver::new(&store, &catalog).resolve("a").is_none());
    assert!(Resolver::new(&store, &catalog).resolve("b").is_none());
}

#[test]
fn test_undo_restores_deleted_edge() {
    let mut store = GraphStore::new();
    let mut ui = Interaction::new();
    let mut history = UndoStack::new(20);
    let a = store.add_node(NodeKind::Dataset, "a", None, None).id.clone();
    let b = store.add_node(NodeKind::Training, "b", None, None).id.clone();
    let edge = store.add_edge(&a, &b, SourceHandle::Right, TargetHandle::Left).unwrap();
    history.push(&store.snapshot()).unwrap();

    let out = ui.pointer_down(
        &mut store,
        &PointerTarget::DeleteButton { edge_id: edge.clone() },
        Default::default(),
    );
    assert!(out.is_structural());
    history.push(&store.snapshot()).unwrap();
    assert!(store.edges().is_empty());

    let previous = history.undo().unwrap().unwrap();
    store.load(previous);
    assert_eq!(store.edge(&edge).map(|e| e.target.as_str()), Some(b.as_str()));

    let next = history.redo().unwrap().unwrap();
    store.load(next);
    assert!(store.edges().is_empty());
}

#[test]
fn test_saved_project_round_trip() {
    let mut store = GraphStore::new();
    let a = add_loader(&mut store, "ds-1");
    let t = store.add_node(NodeKind::Training, "학습 (Train)", None, None).id.clone();
    store.add_edge(&a, &t, SourceHandle::Bottom, TargetHandle::Top).unwrap();
    store.update_node_data(&t, &NodePatch::training(Some(25), Some(0.01)));

    let json = ProjectSnapshot::capture(&store, "Epoch 1/25").to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["edges"][0]["sourceHandle"], "bottom");
    assert_eq!(value["nodes"][0]["data"]["datasetId"], "ds-1");
    assert_eq!(value["nodes"][1]["data"]["epochs"], 25);

    let restored = ProjectSnapshot::decode_lenient(&json).unwrap();
    let mut reloaded = GraphStore::new();
    let (graph, log) = restored.into_parts();
    reloaded.load(graph);
    assert_eq!(reloaded.snapshot(), store.snapshot());
    assert_eq!(log, "Epoch 1/25");
}
