//! # dms-reconcile
//!
//! Post-migration data reconciliation between a source and a target database.
//!
//! For every table listed in the catalog the engine:
//!
//! - **discovers the primary key** from the source catalog views
//! - **samples** up to `sample_rows` rows from the source
//! - **fetches the counterparts** from the target with a single generated
//!   query that joins the table against the sampled keys as literals
//! - **compares** the rows cell by cell after canonicalization
//!
//! Tables run concurrently on a bounded worker pool and every table ends
//! with exactly one [`TableReconciliationResult`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use dms_reconcile::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> dms_reconcile::Result<()> {
//!     let config = Config::load("config.yaml")?.with_auto_tuning();
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let summary = orchestrator.run().await?;
//!     println!("{} of {} tables fully matched", summary.fully_matched, summary.total);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod core;
pub mod dialect;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod sink;

// Re-exports for convenient access
pub use catalog::TableCatalog;
pub use config::{Config, DatabaseConfig, DbType, ReconcileConfig};
pub use core::{MigrationUnit, PrimaryKey, QueryPool, RowSet, SqlValue};
pub use dialect::DialectImpl;
pub use error::{DbSide, ReconcileError, Result};
pub use orchestrator::{HealthCheckResult, Orchestrator};
pub use reconcile::{ReconcileEngine, ReconcileStatus, RunSummary, TableReconciliationResult};
pub use sink::{FileSink, MemorySink, ResultSink};
