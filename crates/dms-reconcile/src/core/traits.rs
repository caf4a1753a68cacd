//! Core traits for engine-agnostic reconciliation.
//!
//! - [`Dialect`]: SQL syntax strategy for a database engine
//! - [`QueryPool`]: pooled query capability against one side of a migration
//!
//! The reconciliation pipeline only ever talks to these two traits. Which
//! engine sits behind them is decided once, from configuration, in
//! [`drivers::connect`](crate::drivers::connect).

use async_trait::async_trait;

use crate::dialect::DialectImpl;
use crate::error::{DbSide, Result};

use super::rows::RowSet;
use super::value::SqlValue;

/// SQL syntax strategy for different database engines.
///
/// Identifiers passed in are already validated plain identifiers; dialects
/// splice them unquoted.
pub trait Dialect: Send + Sync {
    /// Get the dialect identifier (e.g., "oracle", "postgres").
    fn name(&self) -> &str;

    /// Get a parameter placeholder for the given 1-based index.
    ///
    /// - Oracle: `:1`, `:2`, etc.
    /// - MSSQL: `@P1`, `@P2`, etc.
    /// - PostgreSQL: `$1`, `$2`, etc.
    fn param_placeholder(&self, index: usize) -> String;

    /// Catalog query returning the enabled primary key columns of a table in
    /// constraint order. Binds schema as parameter 1 and table as parameter 2
    /// and yields a single `column_name` column.
    fn primary_key_query(&self) -> String;

    /// `SELECT *` from a qualified table, bounded to `limit` rows.
    fn sample_query(&self, qualified_table: &str, limit: usize) -> String;

    /// Render a value as an inline SQL literal.
    fn literal(&self, value: &SqlValue) -> String;

    /// Suffix required after a table-less `SELECT` (Oracle's `FROM DUAL`).
    fn literal_row_suffix(&self) -> &str {
        ""
    }
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Pooled query access to one database.
///
/// Implementations own their connection pool and classify driver errors:
/// transport, TLS and pool failures become
/// [`ReconcileError::Connectivity`](crate::error::ReconcileError::Connectivity),
/// server-reported failures become
/// [`ReconcileError::Query`](crate::error::ReconcileError::Query).
#[async_trait]
pub trait QueryPool: Send + Sync {
    /// Run a query with positional text parameters and collect every row.
    async fn query(&self, sql: &str, params: &[&str]) -> Result<RowSet>;

    /// SQL dialect of this database.
    fn dialect(&self) -> &DialectImpl;

    /// Which side of the migration this pool talks to.
    fn side(&self) -> DbSide;

    /// Round-trip a trivial statement to prove connectivity.
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_string_doubles_quotes() {
        assert_eq!(quote_string("abc"), "'abc'");
        assert_eq!(quote_string("O'Brien"), "'O''Brien'");
        assert_eq!(quote_string(""), "''");
    }
}
