//! Reconciliation orchestrator - runs every table of a catalog.

mod health;

pub use health::HealthCheckResult;

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::catalog::TableCatalog;
use crate::config::Config;
use crate::core::{MigrationUnit, QueryPool};
use crate::drivers;
use crate::error::{DbSide, ReconcileError, Result};
use crate::reconcile::{ReconcileEngine, RunSummary, TableReconciliationResult};
use crate::sink::{FileSink, ResultSink};

/// Reconciliation orchestrator.
pub struct Orchestrator {
    config: Config,
    source: Arc<dyn QueryPool>,
    target: Arc<dyn QueryPool>,
    sink: Arc<dyn ResultSink>,
}

impl Orchestrator {
    /// Connect to both databases and write results to the configured
    /// output directory.
    pub async fn new(config: Config) -> Result<Self> {
        let source = drivers::connect(
            &config.source,
            DbSide::Source,
            config.reconcile.get_max_source_connections(),
        )
        .await?;
        let target = drivers::connect(
            &config.target,
            DbSide::Target,
            config.reconcile.get_max_target_connections(),
        )
        .await?;

        Ok(Self::from_pools(config, source, target))
    }

    /// Build on pools opened elsewhere, for engines without a bundled driver.
    pub fn from_pools(
        config: Config,
        source: Arc<dyn QueryPool>,
        target: Arc<dyn QueryPool>,
    ) -> Self {
        let sink = Arc::new(FileSink::new(
            config.reconcile.output_dir.clone(),
            config.reconcile.verbose,
        ));
        Self {
            config,
            source,
            target,
            sink,
        }
    }

    /// Replace the result sink.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load the catalog from the input directory and reconcile every table.
    pub async fn run(&self) -> Result<RunSummary> {
        let units = TableCatalog::from_dir(
            &self.config.reconcile.input_dir,
            &self.config.reconcile.include_prefix,
        )?;
        self.run_units(units).await
    }

    /// Reconcile `units` with at most `workers` tables in flight.
    ///
    /// Every unit yields exactly one result, whatever happens to it.
    pub async fn run_units(&self, units: Vec<MigrationUnit>) -> Result<RunSummary> {
        let started_at = Utc::now();
        self.sink.prepare()?;

        let workers = self.config.reconcile.get_workers().min(units.len()).max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let engine = ReconcileEngine::new(
            self.source.clone(),
            self.target.clone(),
            self.config.reconcile.sample_rows,
        );

        info!(
            "Reconciling {} tables with {} workers ({} sample rows each)",
            units.len(),
            workers,
            self.config.reconcile.sample_rows
        );

        let mut handles = Vec::with_capacity(units.len());
        for unit in units {
            let permit = semaphore.clone().acquire_owned().await.map_err(|e| {
                ReconcileError::pool(e, "acquiring reconciliation worker slot")
            })?;

            let engine = engine.clone();
            let sink = self.sink.clone();
            let task_unit = unit.clone();
            let handle = tokio::spawn(async move {
                let result = engine.reconcile_table(&task_unit).await;
                if let Err(e) = sink.record(&result) {
                    warn!("{}: could not record result: {}", task_unit, e);
                }
                drop(permit);
                result.status
            });
            handles.push((unit, handle));
        }

        for (unit, handle) in handles {
            match handle.await {
                Ok(status) => info!("{}: {}", unit, status),
                Err(e) => {
                    error!("{}: task panicked - {}", unit, e);
                    let result =
                        TableReconciliationResult::error(&unit, format!("Task panicked: {}", e));
                    if let Err(e) = self.sink.record(&result) {
                        warn!("{}: could not record result: {}", unit, e);
                    }
                }
            }
        }

        let summary = self.sink.finalize(started_at)?;
        info!(
            "Reconciliation finished in {:.1}s: {} matched, {} with differences, {} skipped, {} errored",
            summary.duration_seconds,
            summary.fully_matched,
            summary.with_differences,
            summary.skipped,
            summary.errored
        );
        Ok(summary)
    }

    /// Ping both databases.
    pub async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::ping(self.source.as_ref(), self.target.as_ref()).await
    }
}
