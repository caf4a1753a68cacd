//! Oracle SQL dialect (Strategy pattern).
//!
//! Oracle is the usual source of a reconciliation. Only SQL generation lives
//! here; an Oracle connection is supplied by implementing
//! [`QueryPool`](crate::core::QueryPool).

use crate::core::traits::{quote_string, Dialect};
use crate::core::SqlValue;

use super::{numeric_literal, TIMESTAMP_FORMAT};

/// Oracle dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Create a new Oracle dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for OracleDialect {
    fn name(&self) -> &str {
        "oracle"
    }

    fn param_placeholder(&self, index: usize) -> String {
        format!(":{}", index)
    }

    fn primary_key_query(&self) -> String {
        format!(
            "SELECT cols.column_name AS column_name \
             FROM all_constraints cons \
             JOIN all_cons_columns cols \
               ON cons.owner = cols.owner \
              AND cons.constraint_name = cols.constraint_name \
              AND cons.table_name = cols.table_name \
             WHERE cons.constraint_type = 'P' \
               AND cons.status = 'ENABLED' \
               AND cons.owner = {} \
               AND cons.table_name = {} \
             ORDER BY cols.position",
            self.param_placeholder(1),
            self.param_placeholder(2)
        )
    }

    fn sample_query(&self, qualified_table: &str, limit: usize) -> String {
        format!("SELECT * FROM {} WHERE ROWNUM <= {}", qualified_table, limit)
    }

    fn literal(&self, value: &SqlValue) -> String {
        if let Some(n) = numeric_literal(value) {
            return n;
        }
        match value {
            SqlValue::Text(s) => quote_string(s),
            SqlValue::Uuid(u) => quote_string(&u.to_string()),
            SqlValue::Bytes(b) => format!("HEXTORAW('{}')", hex::encode_upper(b)),
            SqlValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            SqlValue::Time(t) => quote_string(&t.format("%H:%M:%S%.6f").to_string()),
            SqlValue::DateTime(dt) => format!("TIMESTAMP '{}'", dt.format(TIMESTAMP_FORMAT)),
            SqlValue::DateTimeOffset(dt) => {
                format!("TIMESTAMP '{}'", dt.format("%Y-%m-%d %H:%M:%S%.6f %:z"))
            }
            _ => "NULL".to_string(),
        }
    }

    fn literal_row_suffix(&self) -> &str {
        " FROM DUAL"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_param_placeholder() {
        let dialect = OracleDialect::new();
        assert_eq!(dialect.param_placeholder(1), ":1");
        assert_eq!(dialect.param_placeholder(2), ":2");
    }

    #[test]
    fn test_primary_key_query() {
        let sql = OracleDialect::new().primary_key_query();
        assert!(sql.contains("all_constraints"));
        assert!(sql.contains("all_cons_columns"));
        assert!(sql.contains("constraint_type = 'P'"));
        assert!(sql.contains("status = 'ENABLED'"));
        assert!(sql.contains("cons.owner = :1"));
        assert!(sql.contains("cons.table_name = :2"));
        assert!(sql.ends_with("ORDER BY cols.position"));
    }

    #[test]
    fn test_sample_query_uses_rownum() {
        assert_eq!(
            OracleDialect::new().sample_query("HR.EMP", 1000),
            "SELECT * FROM HR.EMP WHERE ROWNUM <= 1000"
        );
    }

    #[test]
    fn test_literals() {
        let dialect = OracleDialect::new();
        assert_eq!(dialect.literal(&SqlValue::I64(7)), "7");
        assert_eq!(dialect.literal(&SqlValue::from("O'Neil")), "'O''Neil'");
        let d = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(dialect.literal(&SqlValue::Date(d)), "DATE '2024-01-31'");
        assert_eq!(
            dialect.literal(&SqlValue::DateTime(d.and_hms_opt(10, 5, 0).unwrap())),
            "TIMESTAMP '2024-01-31 10:05:00.000000'"
        );
        assert_eq!(dialect.literal(&SqlValue::Bytes(vec![0xab, 0x01])), "HEXTORAW('AB01')");
        assert_eq!(dialect.literal_row_suffix(), " FROM DUAL");
    }
}
