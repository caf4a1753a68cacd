//! Target fetch generation.
//!
//! The target is queried by primary key only. Sampled key values are inlined
//! as a literal table (`WITH temp AS (SELECT .. UNION SELECT ..)`) joined to
//! the target table, so the same statement shape works on every engine and
//! needs no temporary objects on the target.

use crate::core::identifier::{plain_ident, qualify_plain};
use crate::core::traits::Dialect;
use crate::core::{MigrationUnit, PrimaryKey, RowSet, SqlValue};
use crate::dialect::DialectImpl;
use crate::error::{ReconcileError, Result};

/// One `SELECT <v1> AS k1, <v2> AS k2` block of the literal table.
///
/// `keys` and `values` are paired positionally.
pub fn literal_row(dialect: &DialectImpl, keys: &[String], values: &[SqlValue]) -> String {
    let columns = keys
        .iter()
        .zip(values)
        .map(|(key, value)| format!("{} AS {}", dialect.literal(value), key))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {}{}", columns, dialect.literal_row_suffix())
}

/// Build the statement fetching from the target exactly the rows whose
/// primary key appears in `sample`.
///
/// Every key column must exist in the sample and be non-NULL in every row.
pub fn build_target_fetch(
    dialect: &DialectImpl,
    unit: &MigrationUnit,
    keys: &PrimaryKey,
    sample: &RowSet,
) -> Result<String> {
    if keys.is_empty() {
        return Err(ReconcileError::InvalidRequest(format!(
            "{} has no primary key to fetch by",
            unit
        )));
    }
    if sample.is_empty() {
        return Err(ReconcileError::InvalidRequest(format!(
            "{} sample is empty",
            unit
        )));
    }

    let table = qualify_plain(&unit.schema, &unit.table)?;
    for key in keys.columns() {
        plain_ident(key)?;
    }

    let mut key_positions = Vec::with_capacity(keys.len());
    for key in keys.columns() {
        match sample.column_index(key) {
            Some(idx) => key_positions.push(idx),
            None => {
                return Err(ReconcileError::MalformedKey {
                    table: unit.full_name(),
                    column: key.clone(),
                    row: 1,
                })
            }
        }
    }

    let mut blocks = Vec::with_capacity(sample.len());
    for (row_no, row) in sample.rows().iter().enumerate() {
        let mut values = Vec::with_capacity(keys.len());
        for (key, &idx) in keys.columns().iter().zip(&key_positions) {
            match row.get(idx) {
                Some(value) if !value.is_null() => values.push(value.clone()),
                _ => {
                    return Err(ReconcileError::MalformedKey {
                        table: unit.full_name(),
                        column: key.clone(),
                        row: row_no + 1,
                    })
                }
            }
        }
        blocks.push(literal_row(dialect, keys.columns(), &values));
    }

    let predicates = keys
        .columns()
        .iter()
        .map(|k| format!("a.{k} = temp.{k}"))
        .collect::<Vec<_>>()
        .join(" AND ");

    Ok(format!(
        "WITH temp AS ({}) SELECT a.* FROM {} a, temp WHERE {}",
        blocks.join(" UNION "),
        table,
        predicates
    ))
}
