pub mod attribute;
pub mod checkpoint;
pub mod record;
pub mod tenant_store;

// Re-export core models for easy access
pub use attribute::Attribute;
pub use checkpoint::MigrationVersion;
pub use record::{DeviceStatus, IdentityData, Record};
pub use tenant_store::TenantStoreId;
