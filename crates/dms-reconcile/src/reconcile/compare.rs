//! Row alignment and cell-by-cell comparison.

use std::collections::{BTreeSet, HashMap};

use crate::core::{PrimaryKey, RowSet, SqlValue};
use crate::error::{ReconcileError, Result};

use super::types::{CellDiff, CellVerdict, RowVerdict};

/// Prefix applied to target column names in a [`MatchedRowSet`].
pub const TARGET_PREFIX: &str = "tgt_";

/// A sampled source row with its target counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedRow {
    /// Rendered primary key, `col=value` pairs joined by commas.
    pub primary_key: String,
    pub source: Vec<SqlValue>,
    /// Target values in source column order. All NULL when unmatched, and
    /// NULL for columns the target does not have.
    pub target: Vec<SqlValue>,
    pub matched: bool,
}

/// Source rows left-joined to target rows on the primary key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchedRowSet {
    /// Source column names.
    pub columns: Vec<String>,
    /// Target column names, namespaced with [`TARGET_PREFIX`].
    pub target_columns: Vec<String>,
    /// One entry per source row, in source order.
    pub rows: Vec<MatchedRow>,
}

/// Result of comparing a [`MatchedRowSet`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    /// One verdict per source row, in source order.
    pub verdicts: Vec<RowVerdict>,
    pub rows_validated: usize,
    pub rows_with_differences: usize,
    pub columns_with_differences: BTreeSet<String>,
}

fn key_positions(rows: &RowSet, keys: &PrimaryKey, side: &str) -> Result<Vec<usize>> {
    keys.columns()
        .iter()
        .map(|k| {
            rows.column_index(k).ok_or_else(|| {
                ReconcileError::InvalidRequest(format!(
                    "{} rows have no key column '{}'",
                    side, k
                ))
            })
        })
        .collect()
}

/// Canonical key tuple of a row, or `None` when any key part is NULL.
fn key_tuple(row: &[SqlValue], positions: &[usize]) -> Option<Vec<String>> {
    positions
        .iter()
        .map(|&i| row.get(i).and_then(SqlValue::canonical))
        .collect()
}

fn render_key(keys: &PrimaryKey, row: &[SqlValue], positions: &[usize]) -> String {
    keys.columns()
        .iter()
        .zip(positions)
        .map(|(k, &i)| match row.get(i) {
            Some(value) => format!("{}={}", k, value),
            None => format!("{}=NULL", k),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Left-join `source` to `target` on the canonical primary key tuple.
///
/// When the target holds several rows for one key, the first one wins.
pub fn align(keys: &PrimaryKey, source: &RowSet, target: &RowSet) -> Result<MatchedRowSet> {
    if keys.is_empty() {
        return Err(ReconcileError::InvalidRequest(
            "cannot align rows without a primary key".into(),
        ));
    }

    let source_keys = key_positions(source, keys, "source")?;

    let mut by_key: HashMap<Vec<String>, usize> = HashMap::new();
    if !target.is_empty() {
        let target_keys = key_positions(target, keys, "target")?;
        for (i, row) in target.rows().iter().enumerate() {
            if let Some(tuple) = key_tuple(row, &target_keys) {
                by_key.entry(tuple).or_insert(i);
            }
        }
    }

    // Target position of each source column.
    let column_map: Vec<Option<usize>> = source
        .columns()
        .iter()
        .map(|c| target.column_index(c))
        .collect();

    let rows = source
        .rows()
        .iter()
        .map(|row| {
            let hit = key_tuple(row, &source_keys).and_then(|t| by_key.get(&t).copied());
            let target_values = match hit {
                Some(t) => {
                    let target_row = &target.rows()[t];
                    column_map
                        .iter()
                        .map(|pos| {
                            pos.and_then(|p| target_row.get(p).cloned())
                                .unwrap_or(SqlValue::Null)
                        })
                        .collect()
                }
                None => vec![SqlValue::Null; row.len()],
            };
            MatchedRow {
                primary_key: render_key(keys, row, &source_keys),
                source: row.clone(),
                target: target_values,
                matched: hit.is_some(),
            }
        })
        .collect();

    Ok(MatchedRowSet {
        columns: source.columns().to_vec(),
        target_columns: target
            .columns()
            .iter()
            .map(|c| format!("{}{}", TARGET_PREFIX, c))
            .collect(),
        rows,
    })
}

/// Compare one cell. Two NULLs match; NULL against a value does not.
pub fn compare_cell(column: &str, source: &SqlValue, target: &SqlValue) -> CellVerdict {
    if source.canonical_eq(target) {
        CellVerdict::Match
    } else {
        CellVerdict::NoMatch(CellDiff {
            column: column.to_string(),
            source: source.clone(),
            target: target.clone(),
        })
    }
}

/// Compare every matched row column by column.
pub fn compare(matched: &MatchedRowSet) -> Comparison {
    let mut comparison = Comparison {
        rows_validated: matched.rows.len(),
        ..Default::default()
    };

    for (i, row) in matched.rows.iter().enumerate() {
        let mut differences: Vec<CellDiff> = matched
            .columns
            .iter()
            .zip(row.source.iter().zip(&row.target))
            .filter_map(|(column, (s, t))| match compare_cell(column, s, t) {
                CellVerdict::Match => None,
                CellVerdict::NoMatch(diff) => Some(diff),
            })
            .collect();
        differences.sort_by(|a, b| a.column.cmp(&b.column));

        if !differences.is_empty() {
            comparison.rows_with_differences += 1;
            comparison
                .columns_with_differences
                .extend(differences.iter().map(|d| d.column.clone()));
        }

        comparison.verdicts.push(RowVerdict {
            index: i + 1,
            primary_key: row.primary_key.clone(),
            differences,
        });
    }

    comparison
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn emp(rows: &[(i64, &str, Option<i64>)]) -> RowSet {
        rows.iter().fold(RowSet::new(["id", "name", "salary"]), |rs, (id, name, salary)| {
            rs.with_row(vec![
                SqlValue::I64(*id),
                SqlValue::from(*name),
                SqlValue::from(*salary),
            ])
        })
    }

    #[test]
    fn test_hr_emp_scenario() {
        let source = emp(&[(1, "Ann", Some(100)), (2, "Bob", Some(200))]);
        let target = emp(&[(1, "Ann", Some(100)), (2, "Rob", Some(200))]);
        let keys = PrimaryKey::new(["id"]);

        let matched = align(&keys, &source, &target).unwrap();
        assert_eq!(matched.target_columns, vec!["tgt_id", "tgt_name", "tgt_salary"]);

        let result = compare(&matched);
        assert_eq!(result.rows_validated, 2);
        assert_eq!(result.rows_with_differences, 1);
        assert_eq!(
            result.columns_with_differences.iter().collect::<Vec<_>>(),
            vec!["name"]
        );
        assert!(result.verdicts[0].is_match());
        let diff = &result.verdicts[1];
        assert_eq!(diff.index, 2);
        assert_eq!(diff.primary_key, "id=2");
        assert_eq!(diff.differences[0].source, SqlValue::from("Bob"));
        assert_eq!(diff.differences[0].target, SqlValue::from("Rob"));
    }

    #[test]
    fn test_null_handling() {
        let source = emp(&[(1, "Ann", None), (2, "Bob", None)]);
        let target = emp(&[(1, "Ann", None), (2, "Bob", Some(5))]);
        let result = compare(&align(&PrimaryKey::new(["id"]), &source, &target).unwrap());
        assert!(result.verdicts[0].is_match());
        assert_eq!(result.verdicts[1].differences.len(), 1);
        assert_eq!(result.verdicts[1].differences[0].column, "salary");
    }

    #[test]
    fn test_unmatched_source_row_differs_on_every_value() {
        let source = emp(&[(1, "Ann", Some(1)), (3, "Cy", None)]);
        let target = emp(&[(1, "Ann", Some(1))]);
        let matched = align(&PrimaryKey::new(["id"]), &source, &target).unwrap();
        assert!(!matched.rows[1].matched);

        let result = compare(&matched);
        let cols: Vec<_> = result.verdicts[1]
            .differences
            .iter()
            .map(|d| d.column.as_str())
            .collect();
        assert_eq!(cols, vec!["id", "name"]);
    }

    #[test]
    fn test_keys_align_across_representations() {
        let source = RowSet::new(["id", "v"])
            .with_row(vec![SqlValue::Decimal(Decimal::new(100, 2)), SqlValue::from("x")]);
        let target = RowSet::new(["ID", "V"]).with_row(vec![SqlValue::I64(1), SqlValue::from("x")]);
        let result = compare(&align(&PrimaryKey::new(["id"]), &source, &target).unwrap());
        assert_eq!(result.rows_with_differences, 0);
    }

    #[test]
    fn test_first_target_row_wins() {
        let source = emp(&[(1, "Ann", Some(1))]);
        let target = emp(&[(1, "Ann", Some(1)), (1, "Dup", Some(9))]);
        let result = compare(&align(&PrimaryKey::new(["id"]), &source, &target).unwrap());
        assert_eq!(result.rows_with_differences, 0);
    }

    #[test]
    fn test_source_only_column_compares_against_null() {
        let source = RowSet::new(["id", "legacy"])
            .with_row(vec![SqlValue::I64(1), SqlValue::from("x")]);
        let target = RowSet::new(["id", "added"])
            .with_row(vec![SqlValue::I64(1), SqlValue::from("y")]);
        let result = compare(&align(&PrimaryKey::new(["id"]), &source, &target).unwrap());
        assert_eq!(
            result.columns_with_differences.into_iter().collect::<Vec<_>>(),
            vec!["legacy".to_string()]
        );
    }

    #[test]
    fn test_differences_sorted_by_column() {
        let source = RowSet::new(["id", "z", "a"])
            .with_row(vec![SqlValue::I64(1), SqlValue::I64(1), SqlValue::I64(1)]);
        let target = RowSet::new(["id", "z", "a"])
            .with_row(vec![SqlValue::I64(1), SqlValue::I64(2), SqlValue::I64(2)]);
        let result = compare(&align(&PrimaryKey::new(["id"]), &source, &target).unwrap());
        let cols: Vec<_> = result.verdicts[0]
            .differences
            .iter()
            .map(|d| d.column.as_str())
            .collect();
        assert_eq!(cols, vec!["a", "z"]);
    }

    #[test]
    fn test_empty_key_rejected() {
        let rows = emp(&[(1, "Ann", None)]);
        assert!(align(&PrimaryKey::default(), &rows, &rows).is_err());
    }
}
