//! Table identity and key metadata.
//!
//! These types carry a table through reconciliation. They are created once
//! (by the catalog and key discovery) and never mutated afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single table scheduled for reconciliation.
///
/// Schema and table are upper-cased at creation; two units naming the same
/// table in different case are the same unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MigrationUnit {
    /// Schema name (upper case).
    pub schema: String,
    /// Table name (upper case).
    pub table: String,
}

impl MigrationUnit {
    /// Create a unit, normalizing both parts to upper case.
    pub fn new(schema: impl AsRef<str>, table: impl AsRef<str>) -> Self {
        Self {
            schema: schema.as_ref().trim().to_uppercase(),
            table: table.as_ref().trim().to_uppercase(),
        }
    }

    /// `SCHEMA.TABLE`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

impl fmt::Display for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Ordered primary key columns of a source table.
///
/// Column names are lower-cased so they line up with [`RowSet`](super::RowSet)
/// column names. An empty key is a valid value meaning the table has no
/// enabled primary key and cannot be reconciled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKey {
    columns: Vec<String>,
}

impl PrimaryKey {
    /// Build a key from catalog column names in constraint order.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_normalizes_case() {
        let unit = MigrationUnit::new(" hr ", "Emp");
        assert_eq!(unit.schema, "HR");
        assert_eq!(unit.table, "EMP");
        assert_eq!(unit.full_name(), "HR.EMP");
        assert_eq!(unit, MigrationUnit::new("HR", "EMP"));
    }

    #[test]
    fn test_unit_ordering() {
        let mut units = vec![
            MigrationUnit::new("SALES", "ORDERS"),
            MigrationUnit::new("HR", "EMP"),
            MigrationUnit::new("HR", "DEPT"),
        ];
        units.sort();
        let names: Vec<_> = units.iter().map(|u| u.full_name()).collect();
        assert_eq!(names, vec!["HR.DEPT", "HR.EMP", "SALES.ORDERS"]);
    }

    #[test]
    fn test_primary_key_lowercases() {
        let pk = PrimaryKey::new(["ORDER_ID", "Line_No"]);
        assert_eq!(pk.columns(), &["order_id", "line_no"]);
        assert_eq!(pk.len(), 2);
        assert!(!pk.is_empty());
        assert!(PrimaryKey::default().is_empty());
    }
}
