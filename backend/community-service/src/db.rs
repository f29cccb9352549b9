//! Database connection pool and schema migrations

use crate::config::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::time::Duration;
use tracing::{error, info};

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Database connection pool configuration
#[derive(Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Verification timeout for the first query on a new pool
    pub connect_timeout_secs: u64,
    /// Connection acquisition timeout (get connection from pool)
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl From<&DatabaseConfig> for DbConfig {
    fn from(config: &DatabaseConfig) -> Self {
        let defaults = Self::default();
        Self {
            database_url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections.min(config.max_connections),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs),
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs),
        }
    }
}

fn env_or(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Create a PostgreSQL connection pool and verify it with a probe query
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        "Database Pool Configuration: \
         max_connections={}, min_connections={}, \
         acquire_timeout={}s, idle_timeout={}s, max_lifetime={}s",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout_secs,
        config.idle_timeout_secs,
        config.max_lifetime_secs
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
        .connect(&config.database_url)
        .await?;

    match tokio::time::timeout(
        Duration::from_secs(config.connect_timeout_secs),
        sqlx::query("SELECT 1").execute(&pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            info!("Database pool created and verified successfully");
            Ok(pool)
        }
        Ok(Err(e)) => {
            error!(error = %e, "Database connection verification failed");
            Err(e)
        }
        Err(_) => {
            error!(
                timeout_secs = config.connect_timeout_secs,
                "Database connection verification timeout"
            );
            Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Database verification timeout",
            )))
        }
    }
}

/// Apply pending schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations completed successfully");
    Ok(())
}
