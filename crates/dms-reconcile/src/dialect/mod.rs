//! SQL dialects of the supported engines.
//!
//! - [`OracleDialect`]: Oracle (SQL generation only)
//! - [`MssqlDialect`]: Microsoft SQL Server
//! - [`PostgresDialect`]: PostgreSQL
//!
//! The engine is chosen once from configuration via
//! [`DialectImpl::from_db_type`]; everything downstream holds a
//! [`DialectImpl`].

mod mssql;
mod oracle;
mod postgres;

pub use mssql::MssqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;

use crate::config::DbType;
use crate::core::traits::Dialect;
use crate::core::SqlValue;

/// Timestamp layout shared by the typed literal forms.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Unquoted rendering for numbers and booleans, identical on every engine
/// except where a dialect overrides booleans.
pub(crate) fn numeric_literal(value: &SqlValue) -> Option<String> {
    match value {
        SqlValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        SqlValue::I64(v) => Some(v.to_string()),
        SqlValue::F64(v) if v.is_finite() => Some(v.to_string()),
        SqlValue::Decimal(d) => Some(d.to_string()),
        _ => None,
    }
}

/// The dialect of one side, picked from its configured engine.
///
/// The set of engines is closed, so each method is a plain `match`.
#[derive(Debug, Clone)]
pub enum DialectImpl {
    Oracle(OracleDialect),
    Mssql(MssqlDialect),
    Postgres(PostgresDialect),
}

impl DialectImpl {
    /// Dialect for a configured engine.
    pub fn from_db_type(db_type: DbType) -> Self {
        match db_type {
            DbType::Oracle => DialectImpl::Oracle(OracleDialect::new()),
            DbType::Mssql => DialectImpl::Mssql(MssqlDialect::new()),
            DbType::Postgres => DialectImpl::Postgres(PostgresDialect::new()),
        }
    }

    /// Statement used for health checks.
    pub fn ping_query(&self) -> &'static str {
        match self {
            DialectImpl::Oracle(_) => "SELECT 1 FROM DUAL",
            DialectImpl::Mssql(_) | DialectImpl::Postgres(_) => "SELECT 1",
        }
    }
}

impl Dialect for DialectImpl {
    fn name(&self) -> &str {
        match self {
            DialectImpl::Oracle(d) => d.name(),
            DialectImpl::Mssql(d) => d.name(),
            DialectImpl::Postgres(d) => d.name(),
        }
    }

    fn param_placeholder(&self, index: usize) -> String {
        match self {
            DialectImpl::Oracle(d) => d.param_placeholder(index),
            DialectImpl::Mssql(d) => d.param_placeholder(index),
            DialectImpl::Postgres(d) => d.param_placeholder(index),
        }
    }

    fn primary_key_query(&self) -> String {
        match self {
            DialectImpl::Oracle(d) => d.primary_key_query(),
            DialectImpl::Mssql(d) => d.primary_key_query(),
            DialectImpl::Postgres(d) => d.primary_key_query(),
        }
    }

    fn sample_query(&self, qualified_table: &str, limit: usize) -> String {
        match self {
            DialectImpl::Oracle(d) => d.sample_query(qualified_table, limit),
            DialectImpl::Mssql(d) => d.sample_query(qualified_table, limit),
            DialectImpl::Postgres(d) => d.sample_query(qualified_table, limit),
        }
    }

    fn literal(&self, value: &SqlValue) -> String {
        match self {
            DialectImpl::Oracle(d) => d.literal(value),
            DialectImpl::Mssql(d) => d.literal(value),
            DialectImpl::Postgres(d) => d.literal(value),
        }
    }

    fn literal_row_suffix(&self) -> &str {
        match self {
            DialectImpl::Oracle(d) => d.literal_row_suffix(),
            DialectImpl::Mssql(d) => d.literal_row_suffix(),
            DialectImpl::Postgres(d) => d.literal_row_suffix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db_type() {
        assert_eq!(DialectImpl::from_db_type(DbType::Oracle).name(), "oracle");
        assert_eq!(DialectImpl::from_db_type(DbType::Mssql).name(), "mssql");
        assert_eq!(DialectImpl::from_db_type(DbType::Postgres).name(), "postgres");
    }

    #[test]
    fn test_dispatch_delegates() {
        let dialect = DialectImpl::from_db_type(DbType::Oracle);
        assert_eq!(dialect.literal_row_suffix(), " FROM DUAL");
        assert_eq!(dialect.ping_query(), "SELECT 1 FROM DUAL");
        assert_eq!(dialect.param_placeholder(2), ":2");

        let dialect = DialectImpl::from_db_type(DbType::Mssql);
        assert_eq!(dialect.param_placeholder(1), "@P1");

        let dialect = DialectImpl::from_db_type(DbType::Postgres);
        assert_eq!(dialect.literal_row_suffix(), "");
        assert_eq!(dialect.literal(&SqlValue::Bool(true)), "TRUE");
    }

    #[test]
    fn test_numeric_literal() {
        assert_eq!(numeric_literal(&SqlValue::I64(-3)).as_deref(), Some("-3"));
        assert_eq!(numeric_literal(&SqlValue::F64(2.5)).as_deref(), Some("2.5"));
        assert_eq!(numeric_literal(&SqlValue::F64(f64::NAN)), None);
        assert_eq!(numeric_literal(&SqlValue::from("1")), None);
    }
}
