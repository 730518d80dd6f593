//! Tabular dataset views and the two row transforms applied while walking
//! a pipeline: column drop and vertical concatenation.

use serde::{Deserialize, Serialize};

/// Rows of string cells; the first row is the header
pub type Table = Vec<Vec<String>>;

/// Train/validation/test partitions of a dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Splits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<Table>,
}

/// The dataset that reaches a node, derived on demand and never stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Table>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splits: Option<Splits>,
}

impl ResolvedView {
    pub fn from_data(data: Table) -> Self {
        Self {
            data: Some(data),
            splits: None,
        }
    }

    /// Parse stored dataset content (`{"data": rows}` or `{"splits": {...}}`)
    ///
    /// Malformed content is logged and yields `None`.
    pub fn parse(content: &str) -> Option<Self> {
        match serde_json::from_str(content) {
            Ok(view) => Some(view),
            Err(e) => {
                log::warn!("Failed to parse dataset content: {}", e);
                None
            }
        }
    }

    /// Apply a transform to `data` and to every present split
    pub fn map_tables(self, f: impl Fn(Table) -> Table) -> Self {
        Self {
            data: self.data.map(&f),
            splits: self.splits.map(|s| Splits {
                train: s.train.map(&f),
                validation: s.validation.map(&f),
                test: s.test.map(&f),
            }),
        }
    }

    /// The table used for column inspection: `data` when non-empty,
    /// otherwise the training split when non-empty
    pub fn representative(&self) -> Option<&Table> {
        self.data
            .as_ref()
            .filter(|t| !t.is_empty())
            .or_else(|| {
                self.splits
                    .as_ref()
                    .and_then(|s| s.train.as_ref())
                    .filter(|t| !t.is_empty())
            })
    }

    /// Header row of the representative table
    pub fn header(&self) -> Option<&[String]> {
        self.representative()
            .and_then(|t| t.first())
            .map(Vec::as_slice)
    }
}

/// Remove the columns whose header name is listed in `names`
///
/// Row order and the relative order of remaining columns are kept. Rows
/// shorter than the header keep whatever cells they have.
pub fn drop_columns(table: Table, names: &[String]) -> Table {
    let Some(header) = table.first() else {
        return table;
    };
    let keep: Vec<bool> = header.iter().map(|h| !names.contains(h)).collect();
    if keep.iter().all(|k| *k) {
        return table;
    }

    table
        .into_iter()
        .map(|row| {
            row.into_iter()
                .enumerate()
                .filter_map(|(i, cell)| keep.get(i).copied().unwrap_or(true).then_some(cell))
                .collect()
        })
        .collect()
}

/// Stack tables vertically, matching columns by position
///
/// The first non-empty table is taken whole; every later table contributes
/// its rows minus the header, and is skipped when its header length differs
/// from the first. Returns `None` when no non-empty table is given.
pub fn concat_tables<I>(tables: I) -> Option<Table>
where
    I: IntoIterator<Item = Table>,
{
    let mut tables = tables.into_iter().filter(|t| !t.is_empty());
    let mut merged = tables.next()?;
    let width = merged[0].len();

    for table in tables {
        if table[0].len() != width {
            log::debug!(
                "Skipping table with {} columns while concatenating {} columns",
                table[0].len(),
                width
            );
            continue;
        }
        merged.extend(table.into_iter().skip(1));
    }

    Some(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Table {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_drop_columns_keeps_order() {
        let t = table(&[&["a", "b", "c"], &["1", "2", "3"], &["4", "5", "6"]]);
        let dropped = drop_columns(t, &["b".to_string()]);
        assert_eq!(dropped, table(&[&["a", "c"], &["1", "3"], &["4", "6"]]));
    }

    #[test]
    fn test_drop_unknown_column_is_noop() {
        let t = table(&[&["a"], &["1"]]);
        assert_eq!(drop_columns(t.clone(), &["zzz".to_string()]), t);
    }

    #[test]
    fn test_drop_twice_matches_drop_once() {
        let t = table(&[&["a", "b"], &["1", "x"]]);
        let names = vec!["b".to_string()];
        let once = drop_columns(t.clone(), &names);
        let twice = drop_columns(drop_columns(t, &names), &names);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_drop_handles_ragged_rows() {
        let t = table(&[&["a", "b", "c"], &["1"]]);
        let dropped = drop_columns(t, &["a".to_string()]);
        assert_eq!(dropped, table(&[&["b", "c"], &[]]));
    }

    #[test]
    fn test_concat_row_count() {
        let first = table(&[&["h1", "h2"], &["1", "2"], &["3", "4"]]);
        let second = table(&[&["h1", "h2"], &["5", "6"], &["7", "8"], &["9", "0"]]);
        let merged = concat_tables(vec![first, second]).unwrap();
        assert_eq!(merged.len(), 1 + 2 + 3);
        assert_eq!(merged[0], vec!["h1", "h2"]);
    }

    #[test]
    fn test_concat_skips_mismatched_header() {
        let first = table(&[&["a"], &["1"]]);
        let wide = table(&[&["a", "b"], &["2", "3"]]);
        let third = table(&[&["z"], &["4"]]);
        let merged = concat_tables(vec![first, wide, third]).unwrap();
        assert_eq!(merged, table(&[&["a"], &["1"], &["4"]]));
    }

    #[test]
    fn test_concat_of_nothing() {
        assert!(concat_tables(Vec::<Table>::new()).is_none());
        assert!(concat_tables(vec![Table::new()]).is_none());
    }

    #[test]
    fn test_map_tables_touches_every_split() {
        let view = ResolvedView {
            data: None,
            splits: Some(Splits {
                train: Some(table(&[&["a", "b"], &["1", "2"]])),
                validation: None,
                test: Some(table(&[&["a", "b"], &["3", "4"]])),
            }),
        };
        let names = vec!["a".to_string()];
        let dropped = view.map_tables(|t| drop_columns(t, &names));
        let splits = dropped.splits.unwrap();
        assert_eq!(splits.train.unwrap(), table(&[&["b"], &["2"]]));
        assert!(splits.validation.is_none());
        assert_eq!(splits.test.unwrap(), table(&[&["b"], &["4"]]));
    }

    #[test]
    fn test_parse_content_shapes() {
        let view = ResolvedView::parse(r#"{"data":[["a","b"],["1","x"]]}"#).unwrap();
        assert_eq!(view.data.unwrap(), table(&[&["a", "b"], &["1", "x"]]));

        let split = ResolvedView::parse(r#"{"splits":{"train":[["a"],["1"]]}}"#).unwrap();
        assert!(split.data.is_none());
        assert!(split.splits.unwrap().validation.is_none());

        assert!(ResolvedView::parse("{not json").is_none());
        assert!(ResolvedView::parse("[1,2]").is_none());
    }

    #[test]
    fn test_representative_falls_back_to_train() {
        let view = ResolvedView {
            data: Some(Table::new()),
            splits: Some(Splits {
                train: Some(table(&[&["x"], &["1"]])),
                ..Splits::default()
            }),
        };
        assert_eq!(view.header().unwrap(), ["x".to_string()]);
    }
}
