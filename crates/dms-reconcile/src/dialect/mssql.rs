//! MSSQL SQL dialect (Strategy pattern).
//!
//! Provides MSSQL-specific SQL syntax for key discovery, sampling and
//! literal rendering.

use crate::core::traits::{quote_string, Dialect};
use crate::core::SqlValue;

use super::{numeric_literal, TIMESTAMP_FORMAT};

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &str {
        "mssql"
    }

    fn param_placeholder(&self, index: usize) -> String {
        // tiberius binds @P1, @P2, ... (1-based)
        format!("@P{}", index)
    }

    fn primary_key_query(&self) -> String {
        format!(
            "SELECT kcu.COLUMN_NAME AS column_name \
             FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
             JOIN INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
               ON tc.CONSTRAINT_SCHEMA = kcu.CONSTRAINT_SCHEMA \
              AND tc.CONSTRAINT_NAME = kcu.CONSTRAINT_NAME \
             WHERE tc.CONSTRAINT_TYPE = 'PRIMARY KEY' \
               AND tc.TABLE_SCHEMA = {} \
               AND tc.TABLE_NAME = {} \
             ORDER BY kcu.ORDINAL_POSITION",
            self.param_placeholder(1),
            self.param_placeholder(2)
        )
    }

    fn sample_query(&self, qualified_table: &str, limit: usize) -> String {
        format!("SELECT TOP ({}) * FROM {} WITH (NOLOCK)", limit, qualified_table)
    }

    fn literal(&self, value: &SqlValue) -> String {
        if let Some(n) = numeric_literal(value) {
            return n;
        }
        match value {
            // N prefix keeps Unicode text intact
            SqlValue::Text(s) => format!("N{}", quote_string(s)),
            SqlValue::Uuid(u) => format!("CAST('{}' AS UNIQUEIDENTIFIER)", u),
            SqlValue::Bytes(b) => format!("0x{}", hex::encode_upper(b)),
            SqlValue::Date(d) => format!("CAST('{}' AS DATE)", d.format("%Y-%m-%d")),
            SqlValue::Time(t) => format!("CAST('{}' AS TIME)", t.format("%H:%M:%S%.6f")),
            SqlValue::DateTime(dt) => {
                format!("CAST('{}' AS DATETIME2)", dt.format(TIMESTAMP_FORMAT))
            }
            SqlValue::DateTimeOffset(dt) => format!(
                "CAST('{}' AS DATETIMEOFFSET)",
                dt.format("%Y-%m-%d %H:%M:%S%.6f %:z")
            ),
            _ => "NULL".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_param_placeholder() {
        let dialect = MssqlDialect::new();
        assert_eq!(dialect.param_placeholder(1), "@P1");
        assert_eq!(dialect.param_placeholder(10), "@P10");
    }

    #[test]
    fn test_primary_key_query() {
        let sql = MssqlDialect::new().primary_key_query();
        assert!(sql.contains("INFORMATION_SCHEMA.TABLE_CONSTRAINTS"));
        assert!(sql.contains("tc.TABLE_SCHEMA = @P1"));
        assert!(sql.contains("tc.TABLE_NAME = @P2"));
        assert!(sql.ends_with("ORDER BY kcu.ORDINAL_POSITION"));
    }

    #[test]
    fn test_sample_query_uses_top() {
        assert_eq!(
            MssqlDialect::new().sample_query("dbo.Users", 50),
            "SELECT TOP (50) * FROM dbo.Users WITH (NOLOCK)"
        );
    }

    #[test]
    fn test_literals() {
        let dialect = MssqlDialect::new();
        assert_eq!(dialect.literal(&SqlValue::from("it's")), "N'it''s'");
        assert_eq!(dialect.literal(&SqlValue::Bool(true)), "1");
        assert_eq!(dialect.literal(&SqlValue::Bytes(vec![0x0f])), "0x0F");
        let u = Uuid::parse_str("6f1c2a1e-8d8b-4c35-9a55-0c1f7b6f8d11").unwrap();
        assert_eq!(
            dialect.literal(&SqlValue::Uuid(u)),
            "CAST('6f1c2a1e-8d8b-4c35-9a55-0c1f7b6f8d11' AS UNIQUEIDENTIFIER)"
        );
        assert_eq!(dialect.literal_row_suffix(), "");
    }
}
