//! Database driver implementations of [`QueryPool`].
//!
//! - [`mssql`]: Microsoft SQL Server (tiberius + bb8)
//! - [`postgres`]: PostgreSQL (tokio-postgres + deadpool-postgres)
//! - [`common`]: shared utilities (TLS)
//!
//! Oracle has a dialect but no bundled driver; embedders supply one by
//! implementing [`QueryPool`] and handing it to
//! [`Orchestrator::from_pools`](crate::orchestrator::Orchestrator::from_pools).

pub mod common;
pub mod mssql;
pub mod postgres;

use std::sync::Arc;

pub use mssql::MssqlPool;
pub use postgres::PgPool;

use crate::config::{DatabaseConfig, DbType};
use crate::core::QueryPool;
use crate::error::{DbSide, ReconcileError, Result};

/// Open a pooled connection to one side of the migration.
///
/// The engine is resolved here, once; callers only see the trait object.
pub async fn connect(
    config: &DatabaseConfig,
    side: DbSide,
    max_conns: usize,
) -> Result<Arc<dyn QueryPool>> {
    match config.r#type {
        DbType::Mssql => {
            let size = u32::try_from(max_conns).unwrap_or(u32::MAX);
            Ok(Arc::new(MssqlPool::new(config, side, size).await?))
        }
        DbType::Postgres => Ok(Arc::new(PgPool::new(config, side, max_conns).await?)),
        DbType::Oracle => Err(ReconcileError::Config(format!(
            "{} database type 'oracle' has no bundled driver; \
             supply a QueryPool implementation through Orchestrator::from_pools",
            side
        ))),
    }
}

/// A non-null cell the driver could not read. The table ends in error
/// rather than comparing the cell as NULL.
pub(crate) fn conversion_error(
    side: DbSide,
    column: &str,
    detail: impl std::fmt::Display,
) -> ReconcileError {
    ReconcileError::query(side, format!("cannot convert column {}: {}", column, detail))
}
