//! Column type inference
//!
//! Columns are classified from the first data row only: a value that is
//! non-empty after trimming and parses as a number makes the column numeric,
//! anything else (including a missing cell) makes it categorical. A numeric
//! column whose first row holds a sentinel such as `"NA"` is therefore
//! reported as categorical.

use serde::{Deserialize, Serialize};

use crate::dataset::ResolvedView;
use crate::types::PreprocessMethod;

/// Header names split by inferred type, each in header order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypes {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl ColumnTypes {
    pub fn is_empty(&self) -> bool {
        self.numeric.is_empty() && self.categorical.is_empty()
    }

    /// Numeric columns followed by categorical ones
    pub fn all(&self) -> Vec<String> {
        self.numeric
            .iter()
            .chain(self.categorical.iter())
            .cloned()
            .collect()
    }
}

fn is_numeric(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(|v| !v.is_nan())
}

/// Classify the columns of a view's representative table
///
/// Tables with fewer than two rows (header plus one data row) give empty
/// sets.
pub fn infer_column_types(view: &ResolvedView) -> ColumnTypes {
    let mut types = ColumnTypes::default();
    let Some(rows) = view.representative() else {
        return types;
    };
    if rows.len() < 2 {
        return types;
    }

    let (header, sample) = (&rows[0], &rows[1]);
    for (i, name) in header.iter().enumerate() {
        match sample.get(i) {
            Some(value) if is_numeric(value) => types.numeric.push(name.clone()),
            _ => types.categorical.push(name.clone()),
        }
    }
    types
}

/// Which inferred columns a preprocessing method applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnScope {
    Numeric,
    Categorical,
    All,
}

impl ColumnScope {
    pub fn for_method(method: Option<&PreprocessMethod>) -> Self {
        match method {
            Some(PreprocessMethod::Normalization | PreprocessMethod::Standardization) => Self::Numeric,
            Some(PreprocessMethod::OneHot) => Self::Categorical,
            _ => Self::All,
        }
    }
}

/// Columns a preprocessing method should be applied to by default
pub fn suggest_columns(method: Option<&PreprocessMethod>, types: &ColumnTypes) -> (ColumnScope, Vec<String>) {
    let scope = ColumnScope::for_method(method);
    let columns = match scope {
        ColumnScope::Numeric => types.numeric.clone(),
        ColumnScope::Categorical => types.categorical.clone(),
        ColumnScope::All => types.all(),
    };
    (scope, columns)
}
