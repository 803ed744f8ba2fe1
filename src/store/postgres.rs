//! Postgres-backed record store.
//!
//! Each tenant store is a schema: `"{base}"` for the default store and
//! `"{base}-{tenant}"` per tenant. Every schema holds a records table
//! (`id TEXT PRIMARY KEY, status TEXT, id_data JSONB`) and a checkpoint
//! table (`version TEXT PRIMARY KEY, created_at TIMESTAMPTZ DEFAULT now()`).
//! Table names come from [`StoreConfig`].

use super::{RecordFilter, RecordStore};
use crate::config::{PropagationConfig, StoreConfig};
use crate::database::DatabaseConnection;
use crate::error::{PropagationError, PropagationResult};
use crate::models::{DeviceStatus, IdentityData, MigrationVersion, Record, TenantStoreId};
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;

#[derive(Debug, FromRow)]
struct DeviceRow {
    id: String,
    status: String,
    id_data: Option<Json<IdentityData>>,
}

impl TryFrom<DeviceRow> for Record {
    type Error = PropagationError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<DeviceStatus>().map_err(|e| {
            PropagationError::store_unavailable("decode_record", format!("{}: {e}", row.id))
        })?;

        Ok(Record {
            id: row.id,
            status,
            id_data: row.id_data.map(|Json(data)| data).unwrap_or_default(),
        })
    }
}

pub struct PgRecordStore {
    pool: PgPool,
    config: StoreConfig,
}

impl PgRecordStore {
    pub fn new(pool: PgPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    /// Connect using the database and store sections of `config`
    pub async fn connect(config: &PropagationConfig) -> PropagationResult<Self> {
        let connection = DatabaseConnection::connect(&config.database).await?;
        Self::from_connection(connection, config.store.clone()).await
    }

    /// Take over an open connection once the database answers a health
    /// check, so an unreachable store fails before any tenant is touched.
    pub async fn from_connection(
        connection: DatabaseConnection,
        config: StoreConfig,
    ) -> PropagationResult<Self> {
        if !connection.health_check().await? {
            return Err(PropagationError::store_unavailable(
                "health_check",
                "unexpected health check result",
            ));
        }

        Ok(Self::new(connection.into_pool(), config))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self, store: &TenantStoreId, table: &str) -> String {
        format!("{}.{}", quote_identifier(store.name()), quote_identifier(table))
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_tenant_stores(&self) -> PropagationResult<Vec<TenantStoreId>> {
        let pattern = format!("{}-%", escape_like(&self.config.base_name));

        let names: Vec<String> = sqlx::query_scalar(
            "SELECT schema_name::text FROM information_schema.schemata \
             WHERE schema_name LIKE $1 ORDER BY schema_name",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PropagationError::store_unavailable("list_tenant_stores", e.to_string()))?;

        Ok(names
            .iter()
            .map(|name| TenantStoreId::from_store_name(&self.config.base_name, name))
            .collect())
    }

    async fn get_page(
        &self,
        store: &TenantStoreId,
        offset: u64,
        limit: u64,
        filter: &RecordFilter,
    ) -> PropagationResult<Vec<Record>> {
        let offset = i64::try_from(offset)
            .map_err(|_| PropagationError::store_unavailable("get_page", "offset out of range"))?;
        let limit = i64::try_from(limit)
            .map_err(|_| PropagationError::store_unavailable("get_page", "limit out of range"))?;

        let sql = format!(
            "SELECT id, status, id_data FROM {} \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY id OFFSET $2 LIMIT $3",
            self.table(store, &self.config.records_table)
        );

        debug!(store = %store, offset, limit, status = ?filter.status, "Fetching record page");

        let rows: Vec<DeviceRow> = sqlx::query_as(&sql)
            .bind(filter.status.map(|status| status.as_str()))
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PropagationError::store_unavailable("get_page", e.to_string()))?;

        rows.into_iter().map(Record::try_from).collect()
    }

    async fn write_checkpoint(
        &self,
        store: &TenantStoreId,
        version: &MigrationVersion,
    ) -> PropagationResult<()> {
        let sql = format!(
            "INSERT INTO {} (version) VALUES ($1) ON CONFLICT (version) DO NOTHING",
            self.table(store, &self.config.checkpoint_table)
        );

        sqlx::query(&sql)
            .bind(version.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| PropagationError::store_unavailable("write_checkpoint", e.to_string()))?;

        Ok(())
    }
}

/// Quote a Postgres identifier, doubling embedded quotes
fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Escape LIKE wildcards so `value` matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
