//! # Attribute Sink
//!
//! Remote inventory service receiving propagated attributes and statuses.
//! Both operations are idempotent upserts on the service side, which is what
//! makes re-running a propagation pass safe. Transport and authentication
//! belong to the implementation.

use crate::error::PropagationResult;
use crate::models::{Attribute, DeviceStatus};
use async_trait::async_trait;

#[async_trait]
pub trait AttributeSink: Send + Sync {
    /// Upsert `attributes` for one device. `tenant` is `None` for the
    /// default store of a single-tenant deployment.
    async fn upsert_attributes(
        &self,
        record_id: &str,
        tenant: Option<&str>,
        source: &str,
        timestamp_millis: i64,
        attributes: &[Attribute],
    ) -> PropagationResult<()>;

    /// Set the lifecycle status of a batch of devices
    async fn set_status(
        &self,
        tenant: Option<&str>,
        record_ids: &[String],
        status: DeviceStatus,
    ) -> PropagationResult<()>;
}
