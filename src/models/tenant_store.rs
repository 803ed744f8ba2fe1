use crate::constants::TENANT_STORE_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle naming one tenant's isolated record collection.
///
/// Tenant stores are named `"{base}-{tenant}"`; the default store of a
/// deployment without tenant partitioning is just `"{base}"` and carries no
/// tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantStoreId {
    name: String,
    tenant: Option<String>,
}

impl TenantStoreId {
    /// The non-partitioned store
    pub fn default_store(base: &str) -> Self {
        Self {
            name: base.to_string(),
            tenant: None,
        }
    }

    pub fn for_tenant(base: &str, tenant: &str) -> Self {
        Self {
            name: format!("{base}{TENANT_STORE_SEPARATOR}{tenant}"),
            tenant: Some(tenant.to_string()),
        }
    }

    /// Rebuild an identifier from a physical store name, recovering the
    /// tenant from the `"{base}-"` prefix when present.
    pub fn from_store_name(base: &str, name: &str) -> Self {
        let tenant = name
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix(TENANT_STORE_SEPARATOR))
            .filter(|tenant| !tenant.is_empty())
            .map(str::to_string);

        Self {
            name: name.to_string(),
            tenant,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tenant owning this store; `None` for the default store.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    pub fn is_default(&self) -> bool {
        self.tenant.is_none()
    }
}

impl fmt::Display for TenantStoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
