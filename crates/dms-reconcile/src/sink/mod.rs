//! Destinations for per-table results.
//!
//! The orchestrator hands every [`TableReconciliationResult`] to a
//! [`ResultSink`] as soon as the table finishes, from whichever task
//! produced it, and asks the sink for the [`RunSummary`] at the end.

mod file;

pub use file::FileSink;

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::reconcile::{RunSummary, TableReconciliationResult};

/// Receives results as tables complete.
///
/// `record` is called concurrently from worker tasks.
pub trait ResultSink: Send + Sync {
    /// Called once before any table runs.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Store one table's result.
    fn record(&self, result: &TableReconciliationResult) -> Result<()>;

    /// Aggregate everything recorded since `prepare`.
    fn finalize(&self, started_at: DateTime<Utc>) -> Result<RunSummary>;
}

/// Lock a result buffer, recovering the data if a writer panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps results in memory.
#[derive(Default)]
pub struct MemorySink {
    results: Mutex<Vec<TableReconciliationResult>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the results recorded so far, in completion order.
    pub fn results(&self) -> Vec<TableReconciliationResult> {
        lock(&self.results).clone()
    }
}

impl ResultSink for MemorySink {
    fn prepare(&self) -> Result<()> {
        lock(&self.results).clear();
        Ok(())
    }

    fn record(&self, result: &TableReconciliationResult) -> Result<()> {
        lock(&self.results).push(result.clone());
        Ok(())
    }

    fn finalize(&self, started_at: DateTime<Utc>) -> Result<RunSummary> {
        Ok(RunSummary::from_results(self.results(), started_at))
    }
}
