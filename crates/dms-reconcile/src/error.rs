//! Error types for the reconciliation library.

use std::fmt;

use thiserror::Error;

/// Which side of the migration a database belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbSide {
    Source,
    Target,
}

impl fmt::Display for DbSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbSide::Source => write!(f, "source"),
            DbSide::Target => write!(f, "target"),
        }
    }
}

/// Main error type for reconciliation operations.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed inclusion-list line. Raised before any table is processed.
    #[error("Invalid input in {source_name} line {line}: {message}")]
    InputFormat {
        source_name: String,
        line: usize,
        message: String,
    },

    /// Database unreachable or authentication failed.
    #[error("Cannot reach {side} database: {message}")]
    Connectivity { side: DbSide, message: String },

    /// Database reported an error for a statement.
    #[error("{side} query failed: {message}")]
    Query { side: DbSide, message: String },

    /// A sampled row is missing a primary key column (or has it NULL).
    #[error("Malformed key for {table}: column '{column}' missing or NULL in sampled row {row}")]
    MalformedKey {
        table: String,
        column: String,
        row: usize,
    },

    /// Request that cannot be turned into SQL (empty key or sample).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Identifier rejected by validation.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconcileError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl fmt::Display, context: impl Into<String>) -> Self {
        ReconcileError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    pub fn connectivity(side: DbSide, message: impl fmt::Display) -> Self {
        ReconcileError::Connectivity {
            side,
            message: message.to_string(),
        }
    }

    pub fn query(side: DbSide, message: impl fmt::Display) -> Self {
        ReconcileError::Query {
            side,
            message: message.to_string(),
        }
    }

    /// True for errors caused by an unreachable database or exhausted pool.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ReconcileError::Connectivity { .. } | ReconcileError::Pool { .. }
        )
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReconcileError::Config(_)
            | ReconcileError::InputFormat { .. }
            | ReconcileError::InvalidIdentifier(_)
            | ReconcileError::Yaml(_) => 1,
            ReconcileError::Connectivity { .. } | ReconcileError::Pool { .. } => 2,
            _ => 3,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ReconcileError::Config("x".into()).exit_code(), 1);
        assert_eq!(
            ReconcileError::connectivity(DbSide::Target, "refused").exit_code(),
            2
        );
        assert_eq!(ReconcileError::query(DbSide::Source, "ORA-00942").exit_code(), 3);
    }

    #[test]
    fn test_connectivity_display_names_side() {
        let err = ReconcileError::connectivity(DbSide::Target, "connection refused");
        assert_eq!(
            err.to_string(),
            "Cannot reach target database: connection refused"
        );
        assert!(err.is_connectivity());
        assert!(!ReconcileError::query(DbSide::Target, "syntax").is_connectivity());
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ReconcileError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error: missing"));
    }
}
