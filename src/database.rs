//! database (db) union structure.
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::config::Postgres;
use crate::readiness::Probe;

pub const DEFAULT_CREDENTIALS: &str = "postgres";
pub const DEFAULT_DATABASE_NAME: &str = "recipe";
pub const DEFAULT_POOL_SIZE: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// Custom db structure to pass to Axum.
#[derive(Clone)]
pub struct Database {
    pub postgres: PgPool,
}

impl Database {
    /// Build the connection pool.
    ///
    /// No connection is opened here; the first one is made on demand, which
    /// lets [`crate::readiness::wait_for_storage`] decide when the database
    /// is reachable.
    pub fn new(config: &Postgres) -> Result<Self, sqlx::Error> {
        let (host, port) = match config.address.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>().map_err(|err| {
                    sqlx::Error::Configuration(Box::new(err))
                })?,
            ),
            None => (config.address.as_str(), 5432),
        };

        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(&config.username)
            .password(&config.password)
            .database(&config.database);

        let postgres = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy_with(options);

        tracing::debug!(%host, port, db = %config.database, "postgres pool created");

        Ok(Self { postgres })
    }

    /// Execute migrations scripts.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.postgres).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl Probe for PgPool {
    type Error = sqlx::Error;

    async fn probe(&self) -> Result<(), Self::Error> {
        let conn = self.acquire().await?;
        drop(conn);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_is_lazy() {
        let config = Postgres {
            address: "127.0.0.1:1".into(),
            ..Default::default()
        };

        let db = Database::new(&config).unwrap();
        assert_eq!(db.postgres.size(), 0);
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let config = Postgres {
            address: "localhost:port".into(),
            ..Default::default()
        };

        assert!(Database::new(&config).is_err());
    }
}
