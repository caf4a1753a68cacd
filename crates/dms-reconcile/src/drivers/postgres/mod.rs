//! PostgreSQL driver: tokio-postgres connections pooled with deadpool.

mod convert;

use std::time::Duration;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, PoolError, RecyclingMethod};
use tokio_postgres::config::SslMode as PgSslMode;
use tokio_postgres::types::ToSql;
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::{QueryPool, RowSet};
use crate::dialect::{DialectImpl, PostgresDialect};
use crate::drivers::common::{pg_connector, SslMode};
use crate::error::{DbSide, ReconcileError, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server-reported errors carry a SQLSTATE; anything else means the
/// connection itself failed.
fn classify(side: DbSide, err: tokio_postgres::Error) -> ReconcileError {
    match err.as_db_error() {
        Some(db) => ReconcileError::query(side, format!("{} ({})", db.message(), db.code().code())),
        None => ReconcileError::connectivity(side, err),
    }
}

/// PostgreSQL [`QueryPool`].
pub struct PgPool {
    pool: Pool,
    dialect: DialectImpl,
    side: DbSide,
}

impl PgPool {
    /// Create a pool of at most `max_size` connections and verify one of them.
    pub async fn new(config: &DatabaseConfig, side: DbSide, max_size: usize) -> Result<Self> {
        let ssl_mode = SslMode::parse(&config.ssl_mode)?;

        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port());
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.connect_timeout(CONNECT_TIMEOUT);
        pg_config.application_name("dms-reconcile");

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let mgr = match pg_connector(ssl_mode, side)? {
            Some(tls) => {
                pg_config.ssl_mode(PgSslMode::Require);
                Manager::from_config(pg_config, tls, mgr_config)
            }
            None => {
                pg_config.ssl_mode(PgSslMode::Disable);
                Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config)
            }
        };

        let pool = Pool::builder(mgr)
            .max_size(max_size.max(1))
            .build()
            .map_err(|e| ReconcileError::pool(e, format!("creating {} PostgreSQL pool", side)))?;

        let pg = Self {
            pool,
            dialect: DialectImpl::Postgres(PostgresDialect::new()),
            side,
        };
        pg.ping().await?;

        info!(
            "Connected to {} PostgreSQL: {} (pool_size={})",
            side,
            config.display_addr(),
            max_size
        );
        Ok(pg)
    }

    async fn get_client(&self) -> Result<Object> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Backend(e) => classify(self.side, e),
            other => ReconcileError::connectivity(self.side, other),
        })
    }
}

#[async_trait]
impl QueryPool for PgPool {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<RowSet> {
        debug!("{} PostgreSQL query: {}", self.side, sql);
        let client = self.get_client().await?;

        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| classify(self.side, e))?;

        let bound: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let rows = client
            .query(&statement, &bound)
            .await
            .map_err(|e| classify(self.side, e))?;

        let mut result = RowSet::new(statement.columns().iter().map(|c| c.name()));
        for row in &rows {
            result.push(convert::row_values(row, self.side)?);
        }
        Ok(result)
    }

    fn dialect(&self) -> &DialectImpl {
        &self.dialect
    }

    fn side(&self) -> DbSide {
        self.side
    }

    async fn ping(&self) -> Result<()> {
        let client = self.get_client().await?;
        client
            .simple_query(self.dialect.ping_query())
            .await
            .map_err(|e| classify(self.side, e))?;
        Ok(())
    }
}
