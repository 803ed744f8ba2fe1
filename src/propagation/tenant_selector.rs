//! # Tenant Selector
//!
//! Resolves which tenant stores a run touches: the one named by the caller,
//! or everything the record store knows about, or the default store when
//! the deployment has no tenant partitioning.

use crate::error::PropagationResult;
use crate::models::TenantStoreId;
use crate::store::RecordStore;
use tracing::info;

pub struct TenantSelector<'a> {
    store: &'a dyn RecordStore,
    base_name: &'a str,
}

impl<'a> TenantSelector<'a> {
    pub fn new(store: &'a dyn RecordStore, base_name: &'a str) -> Self {
        Self { store, base_name }
    }

    /// Stores to process, in processing order. An empty tenant string counts
    /// as no tenant.
    pub async fn select(&self, tenant: Option<&str>) -> PropagationResult<Vec<TenantStoreId>> {
        if let Some(tenant) = tenant.filter(|t| !t.is_empty()) {
            info!(tenant = %tenant, "Propagating inventory for user-specified tenant");
            return Ok(vec![TenantStoreId::for_tenant(self.base_name, tenant)]);
        }

        info!("Propagating inventory for all tenants");
        let stores = self.store.list_tenant_stores().await?;

        if stores.is_empty() {
            info!(
                store = %self.base_name,
                "No tenant stores found - will try the default store"
            );
            return Ok(vec![TenantStoreId::default_store(self.base_name)]);
        }

        Ok(stores)
    }

    /// Tenant names of every discovered tenant store
    pub async fn list_tenants(&self) -> PropagationResult<Vec<String>> {
        let stores = self.store.list_tenant_stores().await?;
        Ok(stores
            .iter()
            .filter_map(|store| store.tenant().map(str::to_string))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryRecordStore;

    #[tokio::test]
    async fn test_explicit_tenant_skips_discovery() {
        let store = InMemoryRecordStore::new().fail_discovery();
        let selector = TenantSelector::new(&store, "deviceauth");

        let stores = selector.select(Some("acme")).await.unwrap();

        assert_eq!(stores, vec![TenantStoreId::for_tenant("deviceauth", "acme")]);
    }

    #[tokio::test]
    async fn test_discovered_stores_keep_order() {
        let store = InMemoryRecordStore::new()
            .with_tenant_store(TenantStoreId::for_tenant("deviceauth", "b"), vec![])
            .with_tenant_store(TenantStoreId::for_tenant("deviceauth", "a"), vec![]);
        let selector = TenantSelector::new(&store, "deviceauth");

        let names: Vec<_> = selector
            .select(None)
            .await
            .unwrap()
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        assert_eq!(names, ["deviceauth-b", "deviceauth-a"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_default_store() {
        let store = InMemoryRecordStore::new();
        let selector = TenantSelector::new(&store, "deviceauth");

        assert_eq!(
            selector.select(None).await.unwrap(),
            vec![TenantStoreId::default_store("deviceauth")]
        );
        assert_eq!(
            selector.select(Some("")).await.unwrap(),
            vec![TenantStoreId::default_store("deviceauth")]
        );
    }

    #[tokio::test]
    async fn test_discovery_failure_is_surfaced() {
        let store = InMemoryRecordStore::new().fail_discovery();
        let selector = TenantSelector::new(&store, "deviceauth");

        let err = selector.select(None).await.unwrap_err();
        assert!(err.is_store_fatal());
    }

    #[tokio::test]
    async fn test_list_tenants() {
        let store = InMemoryRecordStore::new()
            .with_tenant_store(TenantStoreId::for_tenant("deviceauth", "t1"), vec![])
            .with_tenant_store(TenantStoreId::for_tenant("deviceauth", "t2"), vec![]);
        let selector = TenantSelector::new(&store, "deviceauth");

        assert_eq!(selector.list_tenants().await.unwrap(), ["t1", "t2"]);
    }
}
