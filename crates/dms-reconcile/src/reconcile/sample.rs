//! Bounded row sampling from the source table.

use tracing::debug;

use crate::core::identifier::qualify_plain;
use crate::core::traits::Dialect;
use crate::core::{MigrationUnit, QueryPool, RowSet};
use crate::error::Result;

/// Read at most `limit` rows of `unit` in the database's natural order.
///
/// Column names come back lower-cased. An empty table gives an empty set.
pub async fn read_sample(pool: &dyn QueryPool, unit: &MigrationUnit, limit: usize) -> Result<RowSet> {
    let table = qualify_plain(&unit.schema, &unit.table)?;
    let sql = pool.dialect().sample_query(&table, limit);
    let mut rows = pool.query(&sql, &[]).await?;
    rows.truncate(limit);
    debug!("{}: sampled {} rows", unit, rows.len());
    Ok(rows)
}
