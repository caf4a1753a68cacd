//! Inclusion lists: which tables to reconcile.
//!
//! An inclusion list is a text file with one `schema,table` pair per line.
//! Further comma-separated fields (filter columns and the like used when the
//! migration rules were generated) are tolerated and ignored. Blank lines and
//! lines starting with `#` are skipped.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::identifier::is_plain_identifier;
use crate::core::MigrationUnit;
use crate::error::{ReconcileError, Result};

/// Loader for the set of tables in scope.
///
/// Every loader returns units deduplicated and sorted by (schema, table).
/// A malformed line fails the whole load so nothing runs on a partial list.
pub struct TableCatalog;

impl TableCatalog {
    /// Parse the contents of one inclusion list.
    ///
    /// `source_name` only appears in error messages.
    pub fn parse_lines(source_name: &str, text: &str) -> Result<Vec<MigrationUnit>> {
        let mut units = BTreeSet::new();
        Self::parse_into(source_name, text, &mut units)?;
        Ok(units.into_iter().collect())
    }

    /// Parse several inclusion lists into one deduplicated set.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<MigrationUnit>> {
        let mut units = BTreeSet::new();
        for path in paths {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)?;
            Self::parse_into(&path.display().to_string(), &text, &mut units)?;
        }
        Ok(units.into_iter().collect())
    }

    /// Load every file in `dir` whose name starts with `prefix`, in file-name
    /// order.
    pub fn from_dir(dir: &Path, prefix: &str) -> Result<Vec<MigrationUnit>> {
        let files = Self::list_files(dir, prefix)?;
        if files.is_empty() {
            warn!(
                "No inclusion lists matching '{}*' in {}",
                prefix,
                dir.display()
            );
            return Ok(Vec::new());
        }

        let units = Self::from_files(&files)?;
        info!(
            "Loaded {} tables from {} inclusion list(s) in {}",
            units.len(),
            files.len(),
            dir.display()
        );
        Ok(units)
    }

    fn list_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ReconcileError::Config(format!(
                "cannot read input directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().starts_with(prefix) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn parse_into(
        source_name: &str,
        text: &str,
        units: &mut BTreeSet<MigrationUnit>,
    ) -> Result<()> {
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split(',').map(str::trim);
            let schema = fields.next().unwrap_or_default();
            let table = fields.next().unwrap_or_default();

            let bad = |message: String| ReconcileError::InputFormat {
                source_name: source_name.to_string(),
                line: line_no,
                message,
            };

            if schema.is_empty() || table.is_empty() {
                return Err(bad(format!(
                    "expected 'schema,table', got {:?}",
                    line
                )));
            }
            for name in [schema, table] {
                if !is_plain_identifier(name) {
                    return Err(bad(format!("{:?} is not a plain SQL identifier", name)));
                }
            }

            let unit = MigrationUnit::new(schema, table);
            if !units.insert(unit.clone()) {
                debug!("{}:{}: duplicate entry {}", source_name, line_no, unit);
            }
        }
        Ok(())
    }
}
