//! Configuration type definitions with auto-tuning based on system resources.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::info;

/// Upper bound on concurrent reconciliation workers.
pub const MAX_WORKERS: usize = 100;

/// Default number of rows sampled per table.
pub const DEFAULT_SAMPLE_ROWS: usize = 1000;

/// System resource information for auto-tuning.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total RAM in GB.
    pub total_memory_gb: f64,
    /// Number of CPU cores.
    pub cpu_cores: usize,
}

impl SystemResources {
    /// Detect system resources.
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let total_memory_gb = sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
        let cpu_cores = sys.cpus().len();

        Self {
            total_memory_gb,
            cpu_cores,
        }
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database the data was migrated from.
    pub source: DatabaseConfig,

    /// Database the data was migrated to.
    pub target: DatabaseConfig,

    /// Reconciliation behavior.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl Config {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that weren't explicitly set in the config file.
    pub fn with_auto_tuning(mut self) -> Self {
        let resources = SystemResources::detect();
        info!(
            "System resources: {:.1} GB RAM, {} CPU cores",
            resources.total_memory_gb, resources.cpu_cores
        );
        self.reconcile = self.reconcile.with_auto_tuning(&resources);
        self
    }
}

/// Database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Oracle,
    #[serde(alias = "sqlserver")]
    Mssql,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
}

impl DbType {
    pub fn default_port(&self) -> u16 {
        match self {
            DbType::Oracle => 1521,
            DbType::Mssql => 1433,
            DbType::Postgres => 5432,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbType::Oracle => write!(f, "oracle"),
            DbType::Mssql => write!(f, "mssql"),
            DbType::Postgres => write!(f, "postgres"),
        }
    }
}

/// Connection settings for one database.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database engine.
    pub r#type: DbType,

    /// Database host.
    pub host: String,

    /// Database port (engine default when omitted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name (service name for Oracle).
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// PostgreSQL SSL mode (default: "require").
    #[serde(default = "default_require")]
    pub ssl_mode: String,

    /// MSSQL: encrypt connection (default: true).
    #[serde(default = "default_true")]
    pub encrypt: bool,

    /// MSSQL: trust server certificate (default: false).
    #[serde(default)]
    pub trust_server_cert: bool,
}

impl DatabaseConfig {
    /// Effective port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.r#type.default_port())
    }

    /// `host:port/database` for logs.
    pub fn display_addr(&self) -> String {
        format!("{}:{}/{}", self.host, self.port(), self.database)
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("encrypt", &self.encrypt)
            .field("trust_server_cert", &self.trust_server_cert)
            .finish()
    }
}

/// Reconciliation behavior configuration.
/// Performance fields use Option<T> to distinguish "not set" (auto-tuned)
/// from "explicitly set".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Rows sampled from each source table.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Concurrent table workers. Auto-tuned based on CPU cores if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Write per-cell difference logs and the generated target query.
    #[serde(default)]
    pub verbose: bool,

    /// Directory holding the inclusion lists.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// File name prefix of inclusion lists inside `input_dir`.
    #[serde(default = "default_include_prefix")]
    pub include_prefix: String,

    /// Directory receiving summary and detail logs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum source connections. Auto-tuned based on workers if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_source_connections: Option<usize>,

    /// Maximum target connections. Auto-tuned based on workers if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_target_connections: Option<usize>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
            workers: None,
            verbose: false,
            input_dir: default_input_dir(),
            include_prefix: default_include_prefix(),
            output_dir: default_output_dir(),
            max_source_connections: None,
            max_target_connections: None,
        }
    }
}

impl ReconcileConfig {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that are None (not explicitly set).
    pub fn with_auto_tuning(mut self, resources: &SystemResources) -> Self {
        // Workers are mostly waiting on I/O, so allow two per core.
        if self.workers.is_none() {
            let workers = (resources.cpu_cores * 2).clamp(2, 32);
            self.workers = Some(workers);
        }
        let workers = self.get_workers();

        if self.max_source_connections.is_none() {
            self.max_source_connections = Some(workers.clamp(2, 64));
        }
        if self.max_target_connections.is_none() {
            self.max_target_connections = Some(workers.clamp(2, 64));
        }

        info!(
            "Auto-tuned config: workers={}, source_conns={}, target_conns={}",
            workers,
            self.get_max_source_connections(),
            self.get_max_target_connections(),
        );

        self
    }

    pub fn get_workers(&self) -> usize {
        self.workers.unwrap_or(4).min(MAX_WORKERS)
    }

    pub fn get_max_source_connections(&self) -> usize {
        self.max_source_connections.unwrap_or(8)
    }

    pub fn get_max_target_connections(&self) -> usize {
        self.max_target_connections.unwrap_or(8)
    }
}

// Default value functions for serde
fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("config")
}

fn default_include_prefix() -> String {
    "include".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_require() -> String {
    "require".to_string()
}

fn default_true() -> bool {
    true
}
