//! Property panel view model
//!
//! `PropertyPanel::for_node` gathers what a form needs to edit one node:
//! its current parameters plus whatever the upstream walk can tell about
//! the data reaching it. Edits come back as `PanelEdit` values and are
//! applied through `GraphStore::update_node_data`. The panel holds no node
//! copy; every call reads the store by id.

use serde::Serialize;

use crate::dataset::ResolvedView;
use crate::infer::{infer_column_types, suggest_columns, ColumnScope};
use crate::resolve::{DatasetCatalog, Resolver};
use crate::store::GraphStore;
use crate::types::{DatasetStep, NodeData, NodeId, NodePatch, PreprocessMethod};

/// Architectures offered in the model editor
pub const MODEL_CHOICES: &[(&str, &str)] = &[
    ("CNN", "CNN (Convolutional Neural Network)"),
    ("RNN", "RNN (Recurrent Neural Network)"),
    ("MLP", "MLP (Multi-Layer Perceptron)"),
];

/// A selectable catalog dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetChoice {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// One column row of the column-drop editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFlag {
    pub name: String,
    pub dropped: bool,
    pub target: bool,
}

impl ColumnFlag {
    /// The target column cannot be dropped
    pub fn can_toggle_drop(&self) -> bool {
        !self.target
    }

    /// A dropped column cannot become the target
    pub fn can_be_target(&self) -> bool {
        !self.dropped
    }
}

/// Columns a preprocessing step will apply to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSuggestion {
    pub scope: ColumnScope,
    pub columns: Vec<String>,
}

/// Kind-specific part of the panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PanelBody {
    #[serde(rename_all = "camelCase")]
    Training { epochs: u32, learning_rate: f64 },
    /// `suggestion` is `None` when no data reaches the node
    Preprocess {
        method: Option<PreprocessMethod>,
        suggestion: Option<ColumnSuggestion>,
    },
    DatasetLoad {
        selected: Option<String>,
        choices: Vec<DatasetChoice>,
    },
    /// `columns` is `None` when no data reaches the node
    ColumnDrop { columns: Option<Vec<ColumnFlag>> },
    DataViewer { view: Option<ResolvedView> },
    Model { variant: String, choices: Vec<(String, String)> },
    /// Nothing to configure
    Empty,
}

/// Everything a form needs to render one node's editor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelView {
    pub node_id: NodeId,
    pub title: String,
    /// Read-only node name
    pub label: String,
    pub body: PanelBody,
}

/// A single edit made in the property panel
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEdit {
    ToggleDropped(String),
    SetTarget(String),
    /// Bind a catalog dataset, or clear the binding with `None`
    PickDataset(Option<String>),
    SetEpochs(u32),
    SetLearningRate(f64),
    SetModelVariant(String),
}

/// Builds panel views and applies panel edits
pub struct PropertyPanel<'a> {
    catalog: &'a DatasetCatalog,
}

impl<'a> PropertyPanel<'a> {
    pub fn new(catalog: &'a DatasetCatalog) -> Self {
        Self { catalog }
    }

    /// Panel for a node, or `None` if it no longer exists
    pub fn for_node(&self, store: &GraphStore, node_id: &str) -> Option<PanelView> {
        let node = store.node(node_id)?;
        let upstream = || Resolver::new(store, self.catalog).resolve(node_id);

        let body = match &node.data {
            NodeData::Training {
                epochs,
                learning_rate,
            } => PanelBody::Training {
                epochs: *epochs,
                learning_rate: *learning_rate,
            },
            NodeData::Preprocess { method, .. } => PanelBody::Preprocess {
                method: method.clone(),
                suggestion: upstream()
                    .filter(|v| v.data.is_some() || v.splits.is_some())
                    .map(|view| {
                        let (scope, columns) =
                            suggest_columns(method.as_ref(), &infer_column_types(&view));
                        ColumnSuggestion { scope, columns }
                    }),
            },
            NodeData::Dataset(DatasetStep::Load { dataset_id, .. }) => PanelBody::DatasetLoad {
                selected: dataset_id.clone(),
                choices: self
                    .catalog
                    .records()
                    .iter()
                    .map(|r| DatasetChoice {
                        id: r.id.clone(),
                        name: r.name.clone(),
                        kind: r.kind.clone(),
                    })
                    .collect(),
            },
            NodeData::Dataset(DatasetStep::ColumnDrop {
                dropped_columns,
                target_column,
            }) => PanelBody::ColumnDrop {
                columns: upstream().map(|view| {
                    infer_column_types(&view)
                        .all()
                        .into_iter()
                        .map(|name| ColumnFlag {
                            dropped: dropped_columns.contains(&name),
                            target: target_column.as_deref() == Some(name.as_str()),
                            name,
                        })
                        .collect()
                }),
            },
            NodeData::Dataset(DatasetStep::DataViewer) => PanelBody::DataViewer { view: upstream() },
            NodeData::Model { variant, .. } => PanelBody::Model {
                variant: variant.clone(),
                choices: MODEL_CHOICES
                    .iter()
                    .map(|(v, l)| (v.to_string(), l.to_string()))
                    .collect(),
            },
            NodeData::Dataset(_) | NodeData::Evaluation => PanelBody::Empty,
        };

        Some(PanelView {
            node_id: node.id.clone(),
            title: format!("{} 속성 설정", node.label),
            label: node.display_label().to_string(),
            body,
        })
    }

    /// Apply one edit; returns true if the node changed
    ///
    /// Toggling the target column's drop flag and targeting a dropped column
    /// are rejected. Non-positive or non-finite training values are ignored.
    pub fn apply_edit(&self, store: &mut GraphStore, node_id: &str, edit: PanelEdit) -> bool {
        let Some(node) = store.node(node_id) else {
            return false;
        };

        let patch = match (&node.data, edit) {
            (
                NodeData::Dataset(DatasetStep::ColumnDrop {
                    dropped_columns,
                    target_column,
                }),
                PanelEdit::ToggleDropped(column),
            ) => {
                if target_column.as_deref() == Some(column.as_str()) {
                    log::debug!("Column '{}' is the target and cannot be dropped", column);
                    return false;
                }
                let mut next = dropped_columns.clone();
                match next.iter().position(|c| *c == column) {
                    Some(i) => {
                        next.remove(i);
                    }
                    None => next.push(column),
                }
                NodePatch::dropped_columns(next)
            }
            (
                NodeData::Dataset(DatasetStep::ColumnDrop {
                    dropped_columns, ..
                }),
                PanelEdit::SetTarget(column),
            ) => {
                if dropped_columns.contains(&column) {
                    log::debug!("Column '{}' is dropped and cannot be the target", column);
                    return false;
                }
                NodePatch::target_column(column)
            }
            (NodeData::Dataset(DatasetStep::Load { .. }), PanelEdit::PickDataset(id)) => {
                let name = id
                    .as_deref()
                    .and_then(|id| self.catalog.find(id))
                    .map(|r| r.name.clone());
                NodePatch {
                    dataset_id: Some(id),
                    dataset_name: Some(name),
                    ..NodePatch::default()
                }
            }
            (NodeData::Training { .. }, PanelEdit::SetEpochs(epochs)) if epochs > 0 => {
                NodePatch::training(Some(epochs), None)
            }
            (NodeData::Training { .. }, PanelEdit::SetLearningRate(rate))
                if rate.is_finite() && rate > 0.0 =>
            {
                NodePatch::training(None, Some(rate))
            }
            (NodeData::Model { .. }, PanelEdit::SetModelVariant(variant)) => {
                NodePatch::model_variant(variant)
            }
            (_, edit) => {
                log::debug!("Ignoring {:?} for node '{}'", edit, node_id);
                return false;
            }
        };

        store.update_node_data(node_id, &patch)
    }

    /// Store the suggested columns on a preprocess node, as done when its
    /// editor is closed. Nothing is stored without a header and a data row.
    pub fn commit_suggested_columns(&self, store: &mut GraphStore, node_id: &str) -> bool {
        let Some(NodeData::Preprocess { method, .. }) = store.node(node_id).map(|n| &n.data) else {
            return false;
        };
        let Some(view) = Resolver::new(store, self.catalog).resolve(node_id) else {
            return false;
        };
        if !view.representative().is_some_and(|t| t.len() >= 2) {
            return false;
        }

        let (_, columns) = suggest_columns(method.as_ref(), &infer_column_types(&view));
        store.update_node_data(node_id, &NodePatch::selected_columns(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::DatasetRecord;
    use crate::types::{NodeKind, SourceHandle, TargetHandle};

    const IRIS: &str = r#"{"data":[["sepal","species","petal"],["5.1","setosa","1.4"]]}"#;

    fn catalog() -> DatasetCatalog {
        DatasetCatalog::new(vec![DatasetRecord {
            id: "iris".to_string(),
            owner_id: "s1".to_string(),
            name: "Iris".to_string(),
            kind: "tabular".to_string(),
            content: IRIS.to_string(),
            is_public: true,
            created_at: String::new(),
        }])
    }

    /// load -> node(kind, subtype)
    fn wired(kind: NodeKind, subtype: Option<&str>, variant: Option<&str>) -> (GraphStore, String) {
        let mut store = GraphStore::new();
        let load = store.add_node(NodeKind::Dataset, "Dataset", None, None).id.clone();
        store.update_node_data(&load, &NodePatch::dataset("iris", None));
        let node = store.add_node(kind, "Step", subtype, variant).id.clone();
        store.add_edge(&load, &node, SourceHandle::Right, TargetHandle::Left);
        (store, node)
    }

    #[test]
    fn test_preprocess_suggestion() {
        let cat = catalog();
        let (store, node) = wired(NodeKind::Preprocess, Some("tabular"), Some("Normalization"));
        let view = PropertyPanel::new(&cat).for_node(&store, &node).unwrap();
        match view.body {
            PanelBody::Preprocess { suggestion, .. } => {
                let suggestion = suggestion.unwrap();
                assert_eq!(suggestion.scope, ColumnScope::Numeric);
                assert_eq!(suggestion.columns, vec!["sepal", "petal"]);
            }
            other => panic!("Expected preprocess body, got {:?}", other),
        }
    }

    #[test]
    fn test_preprocess_without_upstream() {
        let cat = catalog();
        let mut store = GraphStore::new();
        let node = store.add_node(NodeKind::Preprocess, "P", None, None).id.clone();
        let view = PropertyPanel::new(&cat).for_node(&store, &node).unwrap();
        assert_eq!(
            view.body,
            PanelBody::Preprocess {
                method: None,
                suggestion: None
            }
        );
        assert_eq!(view.title, "P 속성 설정");
    }

    #[test]
    fn test_column_drop_constraints() {
        let cat = catalog();
        let panel = PropertyPanel::new(&cat);
        let (mut store, node) = wired(NodeKind::Dataset, Some("column_drop"), None);

        assert!(panel.apply_edit(&mut store, &node, PanelEdit::SetTarget("species".to_string())));
        // The target cannot be dropped
        assert!(!panel.apply_edit(&mut store, &node, PanelEdit::ToggleDropped("species".to_string())));
        assert!(panel.apply_edit(&mut store, &node, PanelEdit::ToggleDropped("petal".to_string())));
        // A dropped column cannot become the target
        assert!(!panel.apply_edit(&mut store, &node, PanelEdit::SetTarget("petal".to_string())));

        let view = panel.for_node(&store, &node).unwrap();
        let PanelBody::ColumnDrop { columns: Some(columns) } = view.body else {
            panic!("Expected column drop body");
        };
        let petal = columns.iter().find(|c| c.name == "petal").unwrap();
        assert!(petal.dropped && !petal.can_be_target());
        let species = columns.iter().find(|c| c.name == "species").unwrap();
        assert!(species.target && !species.can_toggle_drop());
    }

    #[test]
    fn test_toggle_drop_twice_restores() {
        let cat = catalog();
        let panel = PropertyPanel::new(&cat);
        let (mut store, node) = wired(NodeKind::Dataset, Some("column_drop"), None);
        panel.apply_edit(&mut store, &node, PanelEdit::ToggleDropped("sepal".to_string()));
        panel.apply_edit(&mut store, &node, PanelEdit::ToggleDropped("sepal".to_string()));
        assert!(matches!(
            &store.node(&node).unwrap().data,
            NodeData::Dataset(DatasetStep::ColumnDrop { dropped_columns, .. }) if dropped_columns.is_empty()
        ));
    }

    #[test]
    fn test_pick_dataset_records_name() {
        let cat = catalog();
        let panel = PropertyPanel::new(&cat);
        let mut store = GraphStore::new();
        let node = store.add_node(NodeKind::Dataset, "D", Some("dataset_load"), None).id.clone();

        assert!(panel.apply_edit(&mut store, &node, PanelEdit::PickDataset(Some("iris".to_string()))));
        assert_eq!(
            store.node(&node).unwrap().data,
            NodeData::Dataset(DatasetStep::Load {
                dataset_id: Some("iris".to_string()),
                dataset_name: Some("Iris".to_string())
            })
        );

        let view = panel.for_node(&store, &node).unwrap();
        let PanelBody::DatasetLoad { selected, choices } = view.body else {
            panic!("Expected dataset load body");
        };
        assert_eq!(selected.as_deref(), Some("iris"));
        assert_eq!(choices.len(), 1);
    }

    #[test]
    fn test_training_edits_validated() {
        let cat = catalog();
        let panel = PropertyPanel::new(&cat);
        let mut store = GraphStore::new();
        let node = store.add_node(NodeKind::Training, "T", None, None).id.clone();

        assert!(panel.apply_edit(&mut store, &node, PanelEdit::SetEpochs(30)));
        assert!(!panel.apply_edit(&mut store, &node, PanelEdit::SetEpochs(0)));
        assert!(!panel.apply_edit(&mut store, &node, PanelEdit::SetLearningRate(f64::NAN)));
        assert!(!panel.apply_edit(&mut store, &node, PanelEdit::SetModelVariant("RNN".to_string())));
        assert_eq!(
            store.node(&node).unwrap().data,
            NodeData::Training {
                epochs: 30,
                learning_rate: 0.001
            }
        );
    }

    #[test]
    fn test_commit_suggested_columns() {
        let cat = catalog();
        let panel = PropertyPanel::new(&cat);
        let (mut store, node) = wired(NodeKind::Preprocess, Some("tabular"), Some("OneHot"));
        assert!(panel.commit_suggested_columns(&mut store, &node));
        assert!(matches!(
            &store.node(&node).unwrap().data,
            NodeData::Preprocess { selected_columns, .. } if selected_columns == &vec!["species".to_string()]
        ));
    }

    #[test]
    fn test_data_viewer_shows_upstream() {
        let cat = catalog();
        let (store, node) = wired(NodeKind::Dataset, Some("data_viewer"), None);
        let view = PropertyPanel::new(&cat).for_node(&store, &node).unwrap();
        let PanelBody::DataViewer { view: Some(data) } = view.body else {
            panic!("Expected resolved data");
        };
        assert_eq!(data.data.unwrap().len(), 2);
    }
}
