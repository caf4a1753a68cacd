//! Microsoft SQL Server driver: tiberius connections pooled with bb8.

mod convert;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::core::{QueryPool, RowSet};
use crate::dialect::{DialectImpl, MssqlDialect};
use crate::error::{DbSide, ReconcileError, Result};

/// Connection manager for bb8 pool with tiberius.
#[derive(Clone)]
struct TiberiusConnectionManager {
    config: DatabaseConfig,
}

impl TiberiusConnectionManager {
    fn build_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.config.host);
        config.port(self.config.port());
        config.database(&self.config.database);
        config.authentication(AuthMethod::sql_server(
            &self.config.user,
            &self.config.password,
        ));

        if self.config.encrypt {
            if self.config.trust_server_cert {
                config.trust_cert();
            }
            config.encryption(EncryptionLevel::Required);
        } else {
            config.encryption(EncryptionLevel::NotSupported);
        }

        config
    }
}

#[async_trait]
impl bb8::ManageConnection for TiberiusConnectionManager {
    type Connection = Client<Compat<TcpStream>>;
    type Error = tiberius::error::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let config = self.build_config();
        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| tiberius::error::Error::Io {
                kind: e.kind(),
                message: e.to_string(),
            })?;

        tcp.set_nodelay(true).ok();

        Client::connect(config, tcp.compat_write()).await
    }

    async fn is_valid(&self, conn: &mut Self::Connection) -> std::result::Result<(), Self::Error> {
        conn.simple_query("SELECT 1").await?.into_row().await?;
        Ok(())
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool {
        false
    }
}

/// Split tiberius failures into unreachable-server and statement errors.
fn classify(side: DbSide, err: tiberius::error::Error) -> ReconcileError {
    use tiberius::error::Error as TdsError;
    match err {
        TdsError::Io { .. } | TdsError::Tls(_) | TdsError::Routing { .. } | TdsError::Protocol(_) => {
            ReconcileError::connectivity(side, err)
        }
        other => ReconcileError::query(side, other),
    }
}

/// SQL Server [`QueryPool`].
pub struct MssqlPool {
    pool: Pool<TiberiusConnectionManager>,
    dialect: DialectImpl,
    side: DbSide,
}

impl MssqlPool {
    /// Create a pool of at most `max_size` connections and verify one of them.
    pub async fn new(config: &DatabaseConfig, side: DbSide, max_size: u32) -> Result<Self> {
        let manager = TiberiusConnectionManager {
            config: config.clone(),
        };
        let pool = Pool::builder()
            .max_size(max_size.max(1))
            .build(manager)
            .await
            .map_err(|e| classify(side, e))?;

        let mssql = Self {
            pool,
            dialect: DialectImpl::Mssql(MssqlDialect::new()),
            side,
        };
        mssql.ping().await?;

        info!(
            "Connected to {} MSSQL: {} (pool_size={})",
            side,
            config.display_addr(),
            max_size
        );
        Ok(mssql)
    }

    async fn get_client(&self) -> Result<PooledConnection<'_, TiberiusConnectionManager>> {
        self.pool.get().await.map_err(|e| match e {
            bb8::RunError::User(e) => classify(self.side, e),
            bb8::RunError::TimedOut => ReconcileError::pool(
                "timed out waiting for a connection",
                format!("{} MSSQL pool", self.side),
            ),
        })
    }
}

#[async_trait]
impl QueryPool for MssqlPool {
    async fn query(&self, sql: &str, params: &[&str]) -> Result<RowSet> {
        debug!("{} MSSQL query: {}", self.side, sql);
        let mut client = self.get_client().await?;

        let mut query = Query::new(sql);
        for param in params {
            query.bind(*param);
        }

        let mut stream = query
            .query(&mut *client)
            .await
            .map_err(|e| classify(self.side, e))?;

        let columns: Vec<String> = stream
            .columns()
            .await
            .map_err(|e| classify(self.side, e))?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| classify(self.side, e))?;

        let mut result = RowSet::new(&columns);
        for row in rows {
            result.push(convert::row_values(row, &columns, self.side)?);
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
        let mut client = self.get_client().await?;
        client
            .simple_query(self.dialect.ping_query())
            .await
            .map_err(|e| classify(self.side, e))?
            .into_row()
            .await
            .map_err(|e| classify(self.side, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_io_is_connectivity() {
        let err = tiberius::error::Error::Io {
            kind: std::io::ErrorKind::ConnectionRefused,
            message: "connection refused".into(),
        };
        assert!(classify(DbSide::Target, err).is_connectivity());
    }

    #[test]
    fn test_classify_conversion_is_query() {
        let err = tiberius::error::Error::Conversion("bad value".into());
        let classified = classify(DbSide::Source, err);
        assert!(matches!(
            classified,
            ReconcileError::Query {
                side: DbSide::Source,
                ..
            }
        ));
    }
}
