use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

use super::postgres_repo::{PostgresPostRepository, PostgresUserRepository};

/// Configuration for the main database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    /// Upper bound for every individual store call.
    pub store_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 100,
            min_connections: 10,
            connect_timeout: Duration::from_secs(10),
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// Connection pool shared by the repositories and the publisher.
#[derive(Clone)]
pub struct DatabaseConnections {
    pub main: DbConn,
    store_timeout: Duration,
}

impl DatabaseConnections {
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!(pool = config.max_connections, "Main database connected");

        Ok(Self {
            main,
            store_timeout: config.store_timeout,
        })
    }

    pub fn users(&self) -> Arc<PostgresUserRepository> {
        Arc::new(PostgresUserRepository::with_timeout(self.main.clone(), self.store_timeout))
    }

    pub fn posts(&self) -> Arc<PostgresPostRepository> {
        Arc::new(PostgresPostRepository::with_timeout(self.main.clone(), self.store_timeout))
    }
}
