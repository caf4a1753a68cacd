//! Configuration validation.

use super::{Config, DatabaseConfig, MAX_WORKERS};
use crate::error::{ReconcileError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    validate_database("source", &config.source)?;
    validate_database("target", &config.target)?;

    if config.source.host == config.target.host
        && config.source.port() == config.target.port()
        && config.source.database == config.target.database
    {
        return Err(ReconcileError::Config(
            "source and target cannot be the same database".into(),
        ));
    }

    let reconcile = &config.reconcile;
    if reconcile.sample_rows == 0 {
        return Err(ReconcileError::Config(
            "reconcile.sample_rows must be at least 1".into(),
        ));
    }
    match reconcile.workers {
        Some(0) => {
            return Err(ReconcileError::Config(
                "reconcile.workers must be at least 1".into(),
            ))
        }
        Some(n) if n > MAX_WORKERS => {
            return Err(ReconcileError::Config(format!(
                "reconcile.workers must be at most {}, got {}",
                MAX_WORKERS, n
            )))
        }
        _ => {}
    }
    if reconcile.include_prefix.is_empty() {
        return Err(ReconcileError::Config(
            "reconcile.include_prefix cannot be empty".into(),
        ));
    }

    Ok(())
}

fn validate_database(side: &str, db: &DatabaseConfig) -> Result<()> {
    if db.host.is_empty() {
        return Err(ReconcileError::Config(format!("{}.host is required", side)));
    }
    if db.database.is_empty() {
        return Err(ReconcileError::Config(format!(
            "{}.database is required",
            side
        )));
    }
    if db.user.is_empty() {
        return Err(ReconcileError::Config(format!("{}.user is required", side)));
    }
    Ok(())
}
