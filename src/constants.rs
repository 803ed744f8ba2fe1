//! # Propagation Constants
//!
//! Fixed values that shape what the inventory service observes: page sizes
//! determine batch boundaries in sink calls, and the scope and source labels
//! are part of every upserted attribute set.

/// Page size used when walking every record of a store one by one.
pub const LISTING_BATCH_SIZE: u64 = 100;

/// Page size used by status and identity-data propagation.
pub const STATUS_BATCH_SIZE: u64 = 512;

/// Scope attached to attributes derived from a record's identity payload.
pub const IDENTITY_SCOPE: &str = "identity";

/// Source label reported to the inventory service on attribute upserts.
pub const ATTRIBUTE_SOURCE: &str = "deviceauth";

/// Name of the default (non-partitioned) record store; tenant stores are
/// named `"{DEFAULT_STORE_NAME}-{tenant}"`.
pub const DEFAULT_STORE_NAME: &str = "deviceauth";

/// Separator between the base store name and the tenant id.
pub const TENANT_STORE_SEPARATOR: char = '-';

/// Structured log event names emitted by the tracing observer
pub mod events {
    pub const STORE_STARTED: &str = "propagation.store_started";
    pub const STORE_FINISHED: &str = "propagation.store_finished";
    pub const RECORD_PROPAGATED: &str = "propagation.record_propagated";
    pub const STATUS_BATCH_PROPAGATED: &str = "propagation.status_batch_propagated";
    pub const FAILURE: &str = "propagation.failure";
    pub const CHECKPOINT_WRITTEN: &str = "propagation.checkpoint_written";
    pub const CHECKPOINT_SKIPPED: &str = "propagation.checkpoint_skipped";
}
