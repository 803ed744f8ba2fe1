//! # Record Store
//!
//! Read access to per-tenant device records, tenant store discovery and
//! checkpoint persistence. The propagation engine only ever talks to a
//! store through [`RecordStore`]; [`postgres::PgRecordStore`] is the
//! production implementation.

pub mod postgres;

use crate::error::PropagationResult;
use crate::models::{DeviceStatus, MigrationVersion, Record, TenantStoreId};
use async_trait::async_trait;

pub use postgres::PgRecordStore;

/// Filter applied to a page request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: Option<DeviceStatus>,
}

impl RecordFilter {
    /// Match every record
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(status: DeviceStatus) -> Self {
        Self {
            status: Some(status),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.status.is_none_or(|status| record.status == status)
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Names of every tenant store known to the deployment. An empty list
    /// means the deployment has no tenant partitioning.
    async fn list_tenant_stores(&self) -> PropagationResult<Vec<TenantStoreId>>;

    /// Fetch up to `limit` records matching `filter`, skipping the first
    /// `offset` matches. Ordering must be stable across calls.
    async fn get_page(
        &self,
        store: &TenantStoreId,
        offset: u64,
        limit: u64,
        filter: &RecordFilter,
    ) -> PropagationResult<Vec<Record>>;

    /// Record that propagation logic `version` has been applied to `store`.
    async fn write_checkpoint(
        &self,
        store: &TenantStoreId,
        version: &MigrationVersion,
    ) -> PropagationResult<()>;
}
