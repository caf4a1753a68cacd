//! Tabular query results.

use super::value::SqlValue;

/// Rows returned by a query, with lower-cased column names.
///
/// Rows are rectangular: every row has exactly `columns.len()` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<SqlValue>>,
}

impl RowSet {
    /// Create an empty row set with the given columns.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|c| c.as_ref().to_lowercase())
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with NULL, long rows truncated.
    pub fn push(&mut self, mut row: Vec<SqlValue>) {
        row.resize(self.columns.len(), SqlValue::Null);
        self.rows.push(row);
    }

    /// Builder form of [`push`](Self::push).
    pub fn with_row(mut self, row: Vec<SqlValue>) -> Self {
        self.push(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<SqlValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.to_lowercase();
        self.columns.iter().position(|c| *c == name)
    }

    /// Keep at most `limit` rows.
    pub fn truncate(&mut self, limit: usize) {
        self.rows.truncate(limit);
    }
}
