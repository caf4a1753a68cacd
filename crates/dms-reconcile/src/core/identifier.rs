//! Identifier validation for dynamically built SQL.
//!
//! Schema, table and column names cannot be bound as statement parameters, so
//! every identifier spliced into generated SQL goes through this module first.
//!
//! Reconciliation deliberately emits identifiers *unquoted*: the source and
//! target engines fold unquoted names differently (Oracle to upper case,
//! PostgreSQL to lower case) and a migration service that lower-cases names
//! on the way over relies on exactly that folding. Quoting would pin the case
//! and break the lookup on one side. In exchange, only plain identifiers are
//! accepted.

use crate::error::{ReconcileError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - Oracle: 128 bytes (12.2+)
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects empty names, null bytes and names over the length limit.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ReconcileError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(ReconcileError::InvalidIdentifier(format!(
            "identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ReconcileError::InvalidIdentifier(format!(
            "identifier exceeds maximum length of {} bytes (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// True when `name` can be used unquoted on every supported engine:
/// a letter or underscore followed by letters, digits, `_`, `$` or `#`.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'))
}

/// Validate and return a plain identifier.
pub fn plain_ident(name: &str) -> Result<&str> {
    validate_identifier(name)?;
    if !is_plain_identifier(name) {
        return Err(ReconcileError::InvalidIdentifier(format!(
            "{:?} is not a plain SQL identifier",
            name
        )));
    }
    Ok(name)
}

/// Qualify a table name with its schema, unquoted.
pub fn qualify_plain(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", plain_ident(schema)?, plain_ident(table)?))
}
