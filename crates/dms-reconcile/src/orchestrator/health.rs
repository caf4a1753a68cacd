//! Connectivity checks for both databases.

use std::time::Instant;

use serde::Serialize;

use crate::config::{Config, DatabaseConfig};
use crate::core::QueryPool;
use crate::drivers;
use crate::error::{DbSide, Result};

/// Result of a health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

impl HealthCheckResult {
    fn from_probes(source: SideProbe, target: SideProbe) -> Self {
        Self {
            source_connected: source.error.is_none(),
            source_latency_ms: source.latency_ms,
            target_connected: target.error.is_none(),
            target_latency_ms: target.latency_ms,
            healthy: source.error.is_none() && target.error.is_none(),
            source_error: source.error,
            target_error: target.error,
        }
    }

    /// Connect to both configured databases independently and report on
    /// each. A failure on one side does not hide the state of the other.
    pub async fn probe(config: &Config) -> Self {
        let (source, target) = tokio::join!(
            probe_config(&config.source, DbSide::Source),
            probe_config(&config.target, DbSide::Target),
        );
        Self::from_probes(source, target)
    }

    /// Ping already-open pools.
    pub async fn ping(source: &dyn QueryPool, target: &dyn QueryPool) -> Self {
        let (source, target) = tokio::join!(probe_pool(source), probe_pool(target));
        Self::from_probes(source, target)
    }
}

struct SideProbe {
    latency_ms: u64,
    error: Option<String>,
}

impl SideProbe {
    fn finish(started: Instant, outcome: Result<()>) -> Self {
        Self {
            latency_ms: started.elapsed().as_millis() as u64,
            error: outcome.err().map(|e| e.to_string()),
        }
    }
}

async fn probe_pool(pool: &dyn QueryPool) -> SideProbe {
    let started = Instant::now();
    SideProbe::finish(started, pool.ping().await)
}

async fn probe_config(config: &DatabaseConfig, side: DbSide) -> SideProbe {
    let started = Instant::now();
    let outcome = match drivers::connect(config, side, 1).await {
        Ok(pool) => pool.ping().await,
        Err(e) => Err(e),
    };
    SideProbe::finish(started, outcome)
}
