//! Result types produced by reconciliation.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core::{MigrationUnit, SqlValue};
use crate::error::Result;

/// Outcome of comparing one source cell with its target counterpart.
#[derive(Debug, Clone, PartialEq)]
pub enum CellVerdict {
    Match,
    NoMatch(CellDiff),
}

/// A differing cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellDiff {
    /// Lower-cased column name.
    pub column: String,
    pub source: SqlValue,
    pub target: SqlValue,
}

/// Comparison outcome for one sampled source row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowVerdict {
    /// 1-based position of the row in the sample.
    pub index: usize,
    /// Rendered primary key, `col=value` pairs joined by commas.
    pub primary_key: String,
    /// Differing cells, sorted by column name. Empty when the row matches.
    pub differences: Vec<CellDiff>,
}

impl RowVerdict {
    pub fn is_match(&self) -> bool {
        self.differences.is_empty()
    }
}

/// Final state of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStatus {
    Completed,
    SkippedNoPk,
    SkippedNoSourceData,
    SkippedNoTargetData,
    Error,
}

impl ReconcileStatus {
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            ReconcileStatus::SkippedNoPk
                | ReconcileStatus::SkippedNoSourceData
                | ReconcileStatus::SkippedNoTargetData
        )
    }
}

impl fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconcileStatus::Completed => "completed",
            ReconcileStatus::SkippedNoPk => "skipped_no_pk",
            ReconcileStatus::SkippedNoSourceData => "skipped_no_source_data",
            ReconcileStatus::SkippedNoTargetData => "skipped_no_target_data",
            ReconcileStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Summary-record text for a completed table.
pub const VALIDATION_COMPLETED: &str = "VALIDATION COMPLETED";

/// Everything known about one table after reconciliation.
#[derive(Debug, Clone, Serialize)]
pub struct TableReconciliationResult {
    pub schema: String,
    pub table: String,
    pub rows_validated: usize,
    pub rows_with_differences: usize,
    pub columns_with_differences: BTreeSet<String>,
    pub status: ReconcileStatus,
    /// Reason for a skip or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Differing rows only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub row_verdicts: Vec<RowVerdict>,
    /// Generated target fetch, when one was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_query: Option<String>,
    pub duration_ms: u64,
}

impl TableReconciliationResult {
    fn empty(unit: &MigrationUnit, status: ReconcileStatus, detail: Option<String>) -> Self {
        Self {
            schema: unit.schema.clone(),
            table: unit.table.clone(),
            rows_validated: 0,
            rows_with_differences: 0,
            columns_with_differences: BTreeSet::new(),
            status,
            detail,
            row_verdicts: Vec::new(),
            target_query: None,
            duration_ms: 0,
        }
    }

    pub fn skipped_no_pk(unit: &MigrationUnit) -> Self {
        Self::empty(
            unit,
            ReconcileStatus::SkippedNoPk,
            Some(format!(
                "{} does not have primary keys, skipping data validation!",
                unit
            )),
        )
    }

    pub fn skipped_no_source_data(unit: &MigrationUnit) -> Self {
        Self::empty(
            unit,
            ReconcileStatus::SkippedNoSourceData,
            Some(format!(
                "{} does not have data in source DB, skipping data validation!",
                unit
            )),
        )
    }

    pub fn skipped_no_target_data(unit: &MigrationUnit, target_query: String) -> Self {
        let mut result = Self::empty(
            unit,
            ReconcileStatus::SkippedNoTargetData,
            Some("No data found in target DB, skipping data validation!".to_string()),
        );
        result.target_query = Some(target_query);
        result
    }

    pub fn error(unit: &MigrationUnit, message: impl Into<String>) -> Self {
        Self::empty(unit, ReconcileStatus::Error, Some(message.into()))
    }

    pub fn unit(&self) -> MigrationUnit {
        MigrationUnit::new(&self.schema, &self.table)
    }

    /// True when the table was compared and no differences were found.
    pub fn fully_matched(&self) -> bool {
        self.status == ReconcileStatus::Completed && self.rows_with_differences == 0
    }

    /// The `~`-delimited summary record:
    /// `schema~table~validated~differing~col1,col2~status_or_message`.
    pub fn summary_record(&self) -> String {
        let outcome = match self.status {
            ReconcileStatus::Completed => VALIDATION_COMPLETED,
            _ => self.detail.as_deref().unwrap_or_default(),
        };
        format!(
            "{}~{}~{}~{}~{}~{}",
            self.schema,
            self.table,
            self.rows_validated,
            self.rows_with_differences,
            self.columns_with_differences
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(","),
            outcome.replace('\n', " ")
        )
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub total: usize,
    pub fully_matched: usize,
    pub with_differences: usize,
    pub skipped: usize,
    pub errored: usize,
    /// Sorted by (schema, table).
    pub results: Vec<TableReconciliationResult>,
}

impl RunSummary {
    /// Aggregate results collected since `started_at`.
    pub fn from_results(
        mut results: Vec<TableReconciliationResult>,
        started_at: DateTime<Utc>,
    ) -> Self {
        results.sort_by(|a, b| (&a.schema, &a.table).cmp(&(&b.schema, &b.table)));

        let completed_at = Utc::now();
        let count = |f: &dyn Fn(&TableReconciliationResult) -> bool| {
            results.iter().filter(|r| f(r)).count()
        };

        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at,
            completed_at,
            duration_seconds: (completed_at - started_at).num_milliseconds() as f64 / 1000.0,
            total: results.len(),
            fully_matched: count(&|r| r.fully_matched()),
            with_differences: count(&|r| {
                r.status == ReconcileStatus::Completed && r.rows_with_differences > 0
            }),
            skipped: count(&|r| r.status.is_skipped()),
            errored: count(&|r| r.status == ReconcileStatus::Error),
            results,
        }
    }

    /// True when every table was compared and matched.
    pub fn is_clean(&self) -> bool {
        self.fully_matched == self.total
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
