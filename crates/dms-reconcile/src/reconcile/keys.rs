//! Primary key discovery on the source database.

use tracing::debug;

use crate::core::traits::Dialect;
use crate::core::{MigrationUnit, PrimaryKey, QueryPool, SqlValue};
use crate::error::Result;

/// Look up the enabled primary key of `unit`, columns in constraint order.
///
/// A table without a primary key yields an empty [`PrimaryKey`], not an
/// error. Failures are not retried.
pub async fn discover_keys(pool: &dyn QueryPool, unit: &MigrationUnit) -> Result<PrimaryKey> {
    let sql = pool.dialect().primary_key_query();
    let rows = pool.query(&sql, &[unit.schema.as_str(), unit.table.as_str()]).await?;

    let idx = rows.column_index("column_name").unwrap_or(0);
    let columns: Vec<String> = rows
        .rows()
        .iter()
        .filter_map(|row| match row.get(idx) {
            Some(SqlValue::Text(name)) => Some(name.clone()),
            _ => None,
        })
        .collect();

    debug!("{}: primary key [{}]", unit, columns.join(", "));
    Ok(PrimaryKey::new(columns))
}
