use crate::config::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// Owned Postgres pool built from configuration
pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database pool initialized"
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query through the pool
    pub async fn health_check(&self) -> Result<bool, sqlx::Error> {
        let answer: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(answer == 1)
    }

    pub fn into_pool(self) -> PgPool {
        self.pool
    }
}
