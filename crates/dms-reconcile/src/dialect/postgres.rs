//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Provides PostgreSQL-specific SQL syntax for key discovery, sampling and
//! literal rendering.

use crate::core::traits::{quote_string, Dialect};
use crate::core::SqlValue;

use super::{numeric_literal, TIMESTAMP_FORMAT};

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &str {
        "postgres"
    }

    fn param_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc. (1-based)
        format!("${}", index)
    }

    fn primary_key_query(&self) -> String {
        // Names are matched case-insensitively: the migration lower-cases
        // identifiers while units arrive upper-cased.
        format!(
            "SELECT a.attname::text AS column_name \
             FROM pg_constraint c \
             JOIN pg_class t ON t.oid = c.conrelid \
             JOIN pg_namespace n ON n.oid = t.relnamespace \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(c.conkey) \
             WHERE c.contype = 'p' \
               AND lower(n.nspname) = lower({}) \
               AND lower(t.relname) = lower({}) \
             ORDER BY array_position(c.conkey, a.attnum)",
            self.param_placeholder(1),
            self.param_placeholder(2)
        )
    }

    fn sample_query(&self, qualified_table: &str, limit: usize) -> String {
        format!("SELECT * FROM {} LIMIT {}", qualified_table, limit)
    }

    fn literal(&self, value: &SqlValue) -> String {
        if let SqlValue::Bool(b) = value {
            return if *b { "TRUE" } else { "FALSE" }.to_string();
        }
        if let Some(n) = numeric_literal(value) {
            return n;
        }
        match value {
            SqlValue::Text(s) => quote_string(s),
            SqlValue::Uuid(u) => format!("CAST('{}' AS uuid)", u),
            SqlValue::Bytes(b) => format!("decode('{}', 'hex')", hex::encode(b)),
            SqlValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            SqlValue::Time(t) => format!("TIME '{}'", t.format("%H:%M:%S%.6f")),
            SqlValue::DateTime(dt) => format!("TIMESTAMP '{}'", dt.format(TIMESTAMP_FORMAT)),
            SqlValue::DateTimeOffset(dt) => {
                format!("TIMESTAMPTZ '{}'", dt.format("%Y-%m-%d %H:%M:%S%.6f%:z"))
            }
            _ => "NULL".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_param_placeholder() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.param_placeholder(1), "$1");
        assert_eq!(dialect.param_placeholder(10), "$10");
    }

    #[test]
    fn test_primary_key_query_case_insensitive() {
        let sql = PostgresDialect::new().primary_key_query();
        assert!(sql.contains("c.contype = 'p'"));
        assert!(sql.contains("lower(n.nspname) = lower($1)"));
        assert!(sql.contains("lower(t.relname) = lower($2)"));
        assert!(sql.contains("array_position(c.conkey, a.attnum)"));
    }

    #[test]
    fn test_sample_query_uses_limit() {
        assert_eq!(
            PostgresDialect::new().sample_query("hr.emp", 10),
            "SELECT * FROM hr.emp LIMIT 10"
        );
    }

    #[test]
    fn test_literals() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.literal(&SqlValue::Bool(false)), "FALSE");
        assert_eq!(
            dialect.literal(&SqlValue::Decimal(Decimal::from_str("12.50").unwrap())),
            "12.50"
        );
        assert_eq!(dialect.literal(&SqlValue::from("a'b")), "'a''b'");
        assert_eq!(dialect.literal(&SqlValue::Bytes(vec![0xca, 0xfe])), "decode('cafe', 'hex')");
        assert_eq!(dialect.literal(&SqlValue::Null), "NULL");
    }
}
