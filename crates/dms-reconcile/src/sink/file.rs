//! Log-file output.
//!
//! Per table, in the output directory:
//!
//! - `<SCHEMA>_<TABLE>_data_validation_summary.log`: the `~`-delimited
//!   summary record, preceded by the generated target query in verbose mode
//! - `<SCHEMA>_<TABLE>_data_validation.log` (verbose mode, differences only):
//!   one `Index: N Primary Key: ...` block per differing row
//!
//! plus `run_summary.json` for the whole run.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::reconcile::{RunSummary, TableReconciliationResult};

use super::{lock, ResultSink};

/// Name of the run-level JSON report.
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

/// Writes summary and detail logs into a directory.
pub struct FileSink {
    dir: PathBuf,
    verbose: bool,
    results: Mutex<Vec<TableReconciliationResult>>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            dir: dir.into(),
            verbose,
            results: Mutex::new(Vec::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn summary_path(&self, schema: &str, table: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}_data_validation_summary.log", schema, table))
    }

    pub fn detail_path(&self, schema: &str, table: &str) -> PathBuf {
        self.dir
            .join(format!("{}_{}_data_validation.log", schema, table))
    }

    fn summary_text(&self, result: &TableReconciliationResult) -> String {
        let mut text = String::new();
        if self.verbose {
            if let Some(query) = &result.target_query {
                let _ = writeln!(text, "{}~{}~0~0~~{}", result.schema, result.table, query);
            }
        }
        let _ = writeln!(text, "{}", result.summary_record());
        text
    }

    fn detail_text(result: &TableReconciliationResult) -> String {
        let mut text = String::new();
        for verdict in &result.row_verdicts {
            let _ = writeln!(
                text,
                "Index: {} Primary Key: {}",
                verdict.index, verdict.primary_key
            );
            for diff in &verdict.differences {
                let _ = writeln!(
                    text,
                    "{:>30}: {:>30} : {:>30}",
                    diff.column,
                    diff.source.to_string(),
                    diff.target.to_string()
                );
            }
        }
        text
    }
}

impl ResultSink for FileSink {
    /// Create the directory and remove log files left by a previous run.
    fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        lock(&self.results).clear();

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "log") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!("Removed {} stale log files from {}", removed, self.dir.display());
        Ok(())
    }

    fn record(&self, result: &TableReconciliationResult) -> Result<()> {
        lock(&self.results).push(result.clone());

        fs::write(
            self.summary_path(&result.schema, &result.table),
            self.summary_text(result),
        )?;

        if self.verbose && !result.row_verdicts.is_empty() {
            let path = self.detail_path(&result.schema, &result.table);
            if let Err(e) = fs::write(&path, Self::detail_text(result)) {
                warn!("Could not write detail log {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    fn finalize(&self, started_at: DateTime<Utc>) -> Result<RunSummary> {
        let results = lock(&self.results).clone();
        let summary = RunSummary::from_results(results, started_at);

        let path = self.dir.join(RUN_SUMMARY_FILE);
        fs::write(&path, summary.to_json()?)?;
        info!("Run summary written to {}", path.display());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MigrationUnit, SqlValue};
    use crate::reconcile::{CellDiff, ReconcileStatus, RowVerdict};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn emp_result() -> TableReconciliationResult {
        TableReconciliationResult {
            schema: "HR".into(),
            table: "EMP".into(),
            rows_validated: 2,
            rows_with_differences: 1,
            columns_with_differences: BTreeSet::from(["name".to_string()]),
            status: ReconcileStatus::Completed,
            detail: None,
            row_verdicts: vec![RowVerdict {
                index: 2,
                primary_key: "id=2".into(),
                differences: vec![CellDiff {
                    column: "name".into(),
                    source: SqlValue::from("Bob"),
                    target: SqlValue::from("Rob"),
                }],
            }],
            target_query: Some("WITH temp AS (SELECT 1 AS id) SELECT a.* FROM HR.EMP a, temp WHERE a.id = temp.id".into()),
            duration_ms: 3,
        }
    }

    #[test]
    fn test_prepare_clears_stale_logs_only() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("OLD_T_data_validation_summary.log"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let sink = FileSink::new(dir.path(), false);
        sink.prepare().unwrap();

        assert!(!dir.path().join("OLD_T_data_validation_summary.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_prepare_creates_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("logs");
        FileSink::new(&out, false).prepare().unwrap();
        assert!(out.is_dir());
    }

    #[test]
    fn test_record_writes_summary_without_detail_when_quiet() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path(), false);
        sink.prepare().unwrap();
        sink.record(&emp_result()).unwrap();

        let summary = fs::read_to_string(sink.summary_path("HR", "EMP")).unwrap();
        assert_eq!(summary, "HR~EMP~2~1~name~VALIDATION COMPLETED\n");
        assert!(!sink.detail_path("HR", "EMP").exists());
    }

    #[test]
    fn test_verbose_writes_query_and_detail() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path(), true);
        sink.prepare().unwrap();
        sink.record(&emp_result()).unwrap();

        let summary = fs::read_to_string(sink.summary_path("HR", "EMP")).unwrap();
        let lines: Vec<_> = summary.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("HR~EMP~0~0~~WITH temp AS"));
        assert_eq!(lines[1], "HR~EMP~2~1~name~VALIDATION COMPLETED");

        let detail = fs::read_to_string(sink.detail_path("HR", "EMP")).unwrap();
        let lines: Vec<_> = detail.lines().collect();
        assert_eq!(lines[0], "Index: 2 Primary Key: id=2");
        assert_eq!(lines[1], format!("{:>30}: {:>30} : {:>30}", "name", "Bob", "Rob"));
    }

    #[test]
    fn test_skipped_table_record() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path(), true);
        sink.prepare().unwrap();
        let unit = MigrationUnit::new("hr", "audit");
        sink.record(&TableReconciliationResult::skipped_no_source_data(&unit))
            .unwrap();

        let summary = fs::read_to_string(sink.summary_path("HR", "AUDIT")).unwrap();
        assert_eq!(
            summary.trim_end(),
            "HR~AUDIT~0~0~~HR.AUDIT does not have data in source DB, skipping data validation!"
        );
    }

    #[test]
    fn test_finalize_writes_json() {
        let dir = TempDir::new().unwrap();
        let sink = FileSink::new(dir.path(), false);
        sink.prepare().unwrap();
        sink.record(&emp_result()).unwrap();

        let summary = sink.finalize(Utc::now()).unwrap();
        assert_eq!(summary.with_differences, 1);

        let json = fs::read_to_string(dir.path().join(RUN_SUMMARY_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results"][0]["columns_with_differences"][0], "name");
    }
}
