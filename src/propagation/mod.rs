//! # Inventory Propagation
//!
//! Walks every tenant store in bounded batches and pushes device identity
//! attributes or lifecycle statuses into the inventory service.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌────────────────┐   ┌────────────┐
//! │ Orchestrator │──▶│ TenantSelector │   │ BatchPaginator │──▶│ Record     │
//! │              │   └────────────────┘   └────────────────┘   │ Store      │
//! │  per store ──┼──────────────────────────────▲              └────────────┘
//! │  per page  ──┼──▶┌──────────────────┐   ┌───┴──────┐       ┌────────────┐
//! │              │   │ RecordPropagator │──▶│ mapper   │       │ Attribute  │
//! └──────────────┘   │                  │───┼──────────┼──────▶│ Sink       │
//!                    └──────────────────┘   └──────────┘       └────────────┘
//! ```
//!
//! Stores are processed one after another and pages strictly in offset
//! order. Record and page failures are contained; a store failure ends that
//! store's pass only. Progress and failures are reported through a
//! [`PropagationObserver`](observer::PropagationObserver).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use inventory_propagation::propagation::{
//!     PropagationMode, PropagationOrchestrator, PropagationRequest,
//! };
//! use inventory_propagation::sink::AttributeSink;
//! use inventory_propagation::store::PgRecordStore;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     store: PgRecordStore,
//! #     sink: Arc<dyn AttributeSink>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = PropagationOrchestrator::new(Arc::new(store), sink);
//!
//! let request = PropagationRequest::new(PropagationMode::Statuses)
//!     .with_checkpoint_version("1.2.0");
//!
//! orchestrator.run(&request).await?;
//! # Ok(())
//! # }
//! ```

pub mod mapper;
pub mod observer;
pub mod orchestrator;
pub mod outcome;
pub mod paginator;
pub mod propagator;
pub mod tenant_selector;

use crate::config::PropagationConfig;
use crate::constants::{ATTRIBUTE_SOURCE, DEFAULT_STORE_NAME, LISTING_BATCH_SIZE, STATUS_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use mapper::{identity_attributes, record_attributes};
pub use observer::{PropagationObserver, TracingObserver};
pub use orchestrator::PropagationOrchestrator;
pub use outcome::{CheckpointOutcome, FailureScope, PassFailure, PropagationOutcome, StoreReport};
pub use paginator::BatchPaginator;
pub use propagator::{now_unix_millis, RecordPropagation, RecordPropagator};
pub use tenant_selector::TenantSelector;

/// What a run propagates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropagationMode {
    /// Every record's identity attributes, one upsert per record, pages of
    /// the listing batch size
    FullListing,
    /// Lifecycle statuses, one status call per page, one sweep per status
    Statuses,
    /// Every record's identity attributes, one upsert per record, pages of
    /// the status batch size
    IdentityData,
}

impl fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullListing => write!(f, "full_listing"),
            Self::Statuses => write!(f, "statuses"),
            Self::IdentityData => write!(f, "identity_data"),
        }
    }
}

impl std::str::FromStr for PropagationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_listing" => Ok(Self::FullListing),
            "statuses" => Ok(Self::Statuses),
            "identity_data" => Ok(Self::IdentityData),
            _ => Err(format!("Invalid propagation mode: {s}")),
        }
    }
}

/// Caller inputs of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationRequest {
    pub mode: PropagationMode,
    /// Restrict the run to one tenant; `None` processes every tenant store
    pub tenant: Option<String>,
    /// Version recorded against each store after a clean status pass
    pub checkpoint_version: Option<String>,
    pub dry_run: bool,
}

impl PropagationRequest {
    pub fn new(mode: PropagationMode) -> Self {
        Self {
            mode,
            tenant: None,
            checkpoint_version: None,
            dry_run: false,
        }
    }

    pub fn for_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_checkpoint_version(mut self, version: impl Into<String>) -> Self {
        self.checkpoint_version = Some(version.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Engine knobs, normally derived from [`PropagationConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationSettings {
    pub store_base_name: String,
    pub listing_batch_size: u64,
    pub status_batch_size: u64,
    pub source_label: String,
}

impl Default for PropagationSettings {
    fn default() -> Self {
        Self {
            store_base_name: DEFAULT_STORE_NAME.to_string(),
            listing_batch_size: LISTING_BATCH_SIZE,
            status_batch_size: STATUS_BATCH_SIZE,
            source_label: ATTRIBUTE_SOURCE.to_string(),
        }
    }
}

impl From<&PropagationConfig> for PropagationSettings {
    fn from(config: &PropagationConfig) -> Self {
        Self {
            store_base_name: config.store.base_name.clone(),
            listing_batch_size: config.propagation.listing_batch_size,
            status_batch_size: config.propagation.status_batch_size,
            source_label: config.propagation.source_label.clone(),
        }
    }
}

impl PropagationSettings {
    /// Page size a mode walks its stores with
    pub fn batch_size(&self, mode: PropagationMode) -> u64 {
        match mode {
            PropagationMode::FullListing => self.listing_batch_size,
            PropagationMode::Statuses | PropagationMode::IdentityData => self.status_batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for mode in [
            PropagationMode::FullListing,
            PropagationMode::Statuses,
            PropagationMode::IdentityData,
        ] {
            assert_eq!(mode.to_string().parse::<PropagationMode>(), Ok(mode));
        }
        assert!("everything".parse::<PropagationMode>().is_err());
    }

    #[test]
    fn test_batch_size_per_mode() {
        let settings = PropagationSettings::default();
        assert_eq!(settings.batch_size(PropagationMode::FullListing), 100);
        assert_eq!(settings.batch_size(PropagationMode::Statuses), 512);
        assert_eq!(settings.batch_size(PropagationMode::IdentityData), 512);
    }

    #[test]
    fn test_settings_follow_config() {
        let mut config = PropagationConfig::default();
        config.store.base_name = "auth".to_string();
        config.propagation.status_batch_size = 64;

        let settings = PropagationSettings::from(&config);
        assert_eq!(settings.store_base_name, "auth");
        assert_eq!(settings.status_batch_size, 64);
        assert_eq!(settings.listing_batch_size, 100);
    }
}
