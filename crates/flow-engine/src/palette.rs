//! Node palette catalog
//!
//! Each palette entry is registered at link time with `inventory`, so a host
//! crate can contribute extra entries without touching this module:
//!
//! ```ignore
//! inventory::submit!(flow_engine::PaletteEntry {
//!     order: 60,
//!     kind: NodeKind::Evaluation,
//!     label: "Report",
//!     subitems: &[],
//! });
//! ```
//!
//! Picking an entry maps to a `GraphStore::add_node` call with the label,
//! subtype and variant the palette implies.

use serde::Serialize;

use crate::store::GraphStore;
use crate::types::{FlowNode, NodeKind};

/// Leaf choice under a palette sub-item (a concrete method or model)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteChoice {
    pub label: &'static str,
    pub value: &'static str,
}

/// Second-level palette item; `value` becomes the node's subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaletteGroup {
    pub label: &'static str,
    pub value: &'static str,
    pub children: &'static [PaletteChoice],
}

/// Link-time registration of a palette entry
#[derive(Debug, Serialize)]
pub struct PaletteEntry {
    /// Sort key; lower entries are listed first
    pub order: u32,
    pub kind: NodeKind,
    pub label: &'static str,
    pub subitems: &'static [PaletteGroup],
}

inventory::collect!(PaletteEntry);

const fn choice(label: &'static str, value: &'static str) -> PaletteChoice {
    PaletteChoice { label, value }
}

inventory::submit!(PaletteEntry {
    order: 10,
    kind: NodeKind::Dataset,
    label: "Dataset",
    subitems: &[
        PaletteGroup { label: "Dataset Load", value: "dataset_load", children: &[] },
        PaletteGroup { label: "Column Drop", value: "column_drop", children: &[] },
        PaletteGroup { label: "Concatenate (Merge)", value: "concatenate", children: &[] },
        PaletteGroup { label: "Data Viewer", value: "data_viewer", children: &[] },
    ],
});

inventory::submit!(PaletteEntry {
    order: 20,
    kind: NodeKind::Preprocess,
    label: "데이터 전처리",
    subitems: &[
        PaletteGroup {
            label: "Tabular Processing",
            value: "tabular",
            children: &[
                choice("Normalization (0~1)", "Normalization"),
                choice("Standardization", "Standardization"),
                choice("One-Hot Encoding", "OneHot"),
                choice("Handle Missing Values", "Imputer"),
            ],
        },
        PaletteGroup {
            label: "Image Processing",
            value: "image",
            children: &[
                choice("Resize", "Resize"),
                choice("Grayscale", "Grayscale"),
                choice("Augmentation (Flip/Rot)", "Augmentation"),
            ],
        },
    ],
});

inventory::submit!(PaletteEntry {
    order: 30,
    kind: NodeKind::Model,
    label: "AI Model",
    subitems: &[
        PaletteGroup {
            label: "Classification",
            value: "classification",
            children: &[
                choice("CNN", "CNN"),
                choice("ResNet", "ResNet"),
                choice("VGG", "VGG"),
                choice("MobileNet", "MobileNet"),
                choice("Random Forest", "RandomForest"),
                choice("SVM", "SVM"),
                choice("Decision Tree", "DecisionTree"),
                choice("KNN", "KNN"),
                choice("Logistic Regression", "LogisticRegression"),
            ],
        },
        PaletteGroup {
            label: "Regression",
            value: "regression",
            children: &[
                choice("Linear Regression", "Linear"),
                choice("LSTM", "LSTM"),
                choice("GRU", "GRU"),
                choice("Transformer", "Transformer"),
                choice("Random Forest", "RandomForestRegressor"),
                choice("SVR", "SVR"),
                choice("Decision Tree", "DecisionTreeRegressor"),
                choice("XGBoost", "XGBoost"),
            ],
        },
    ],
});

inventory::submit!(PaletteEntry {
    order: 40,
    kind: NodeKind::Training,
    label: "학습 (Train)",
    subitems: &[],
});

inventory::submit!(PaletteEntry {
    order: 50,
    kind: NodeKind::Evaluation,
    label: "성능 평가",
    subitems: &[],
});

/// What to create for a palette pick
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeTemplate {
    pub kind: NodeKind,
    pub label: String,
    pub subtype: Option<&'static str>,
    pub variant: Option<&'static str>,
}

impl NodeTemplate {
    /// Append a node built from this template
    pub fn add_to<'s>(&self, store: &'s mut GraphStore) -> &'s FlowNode {
        store.add_node(self.kind, self.label.clone(), self.subtype, self.variant)
    }
}

/// The palette, in display order
pub struct Palette {
    entries: Vec<&'static PaletteEntry>,
}

impl Palette {
    /// Every registered entry, sorted by `order`
    pub fn builtin() -> Self {
        let mut entries: Vec<&'static PaletteEntry> =
            inventory::iter::<PaletteEntry>.into_iter().collect();
        entries.sort_by_key(|e| e.order);
        Self { entries }
    }

    pub fn entries(&self) -> &[&'static PaletteEntry] {
        &self.entries
    }

    pub fn entry(&self, kind: NodeKind) -> Option<&'static PaletteEntry> {
        self.entries.iter().copied().find(|e| e.kind == kind)
    }

    /// Resolve a click path to a node template
    ///
    /// Items that only open a submenu (an entry with sub-items, or a group
    /// with children) give `None` until a leaf is picked.
    pub fn select(
        &self,
        kind: NodeKind,
        group: Option<&str>,
        child: Option<&str>,
    ) -> Option<NodeTemplate> {
        let entry = self.entry(kind)?;
        let Some(group) = group else {
            return entry.subitems.is_empty().then(|| NodeTemplate {
                kind,
                label: entry.label.to_string(),
                subtype: None,
                variant: None,
            });
        };

        let group = entry.subitems.iter().find(|g| g.value == group)?;
        match child {
            None if group.children.is_empty() => Some(NodeTemplate {
                kind,
                label: format!("{} ({})", entry.label, group.label),
                subtype: Some(group.value),
                variant: None,
            }),
            None => None,
            Some(child) => {
                let picked = group.children.iter().find(|c| c.value == child)?;
                Some(NodeTemplate {
                    kind,
                    label: format!("{} Model", picked.label),
                    subtype: Some(group.value),
                    variant: Some(picked.value),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatasetStep, NodeData, PreprocessMethod};

    #[test]
    fn test_builtin_order() {
        let palette = Palette::builtin();
        let kinds: Vec<NodeKind> = palette.entries().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Dataset,
                NodeKind::Preprocess,
                NodeKind::Model,
                NodeKind::Training,
                NodeKind::Evaluation
            ]
        );
    }

    #[test]
    fn test_select_top_level_entry() {
        let palette = Palette::builtin();
        let template = palette.select(NodeKind::Training, None, None).unwrap();
        assert_eq!(template.label, "학습 (Train)");
        assert!(template.subtype.is_none());

        // Entries with sub-items only open a menu
        assert!(palette.select(NodeKind::Dataset, None, None).is_none());
    }

    #[test]
    fn test_select_dataset_subitem() {
        let palette = Palette::builtin();
        let template = palette
            .select(NodeKind::Dataset, Some("concatenate"), None)
            .unwrap();
        assert_eq!(template.label, "Dataset (Concatenate (Merge))");

        let mut store = GraphStore::new();
        let node = template.add_to(&mut store);
        assert_eq!(node.data, NodeData::Dataset(DatasetStep::Concatenate));
    }

    #[test]
    fn test_select_leaf_child() {
        let palette = Palette::builtin();
        let template = palette
            .select(NodeKind::Model, Some("regression"), Some("XGBoost"))
            .unwrap();
        assert_eq!(template.label, "XGBoost Model");
        assert_eq!(template.subtype, Some("regression"));
        assert_eq!(template.variant, Some("XGBoost"));

        // A group with children needs a child
        assert!(palette.select(NodeKind::Model, Some("regression"), None).is_none());
        assert!(palette.select(NodeKind::Model, Some("regression"), Some("CNN")).is_none());
    }

    #[test]
    fn test_preprocess_leaf_sets_method() {
        let palette = Palette::builtin();
        let template = palette
            .select(NodeKind::Preprocess, Some("tabular"), Some("OneHot"))
            .unwrap();
        let mut store = GraphStore::new();
        let node = template.add_to(&mut store);
        assert!(matches!(
            &node.data,
            NodeData::Preprocess { family: Some(f), method: Some(PreprocessMethod::OneHot), .. } if f == "tabular"
        ));
    }
}
