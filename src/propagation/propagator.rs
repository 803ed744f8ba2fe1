//! # Record Propagator
//!
//! Sends one record's identity attributes, or one page of statuses, to the
//! attribute sink. Under dry-run all mapping work still happens and the
//! sink is never called.

use super::mapper::record_attributes;
use crate::error::PropagationResult;
use crate::models::{Attribute, DeviceStatus, Record};
use crate::sink::AttributeSink;
use chrono::Utc;

/// Wall-clock time in milliseconds since the Unix epoch
pub fn now_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// What propagating one record produced
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPropagation {
    pub record_id: String,
    pub attributes: Vec<Attribute>,
    /// Whether the sink was called (false under dry-run)
    pub dispatched: bool,
}

pub struct RecordPropagator<'a> {
    sink: &'a dyn AttributeSink,
    source: &'a str,
    clock: fn() -> i64,
    dry_run: bool,
}

impl<'a> RecordPropagator<'a> {
    pub fn new(sink: &'a dyn AttributeSink, source: &'a str, dry_run: bool) -> Self {
        Self {
            sink,
            source,
            clock: now_unix_millis,
            dry_run,
        }
    }

    /// Read upsert timestamps from `clock` instead of the wall clock
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Map `record` and upsert its attributes for `tenant`.
    ///
    /// Mapping failures surface before any sink call, so a record that
    /// cannot be encoded is never partially sent.
    pub async fn propagate(
        &self,
        record: &Record,
        tenant: Option<&str>,
    ) -> PropagationResult<RecordPropagation> {
        let attributes = record_attributes(record)?;

        if !self.dry_run {
            self.sink
                .upsert_attributes(&record.id, tenant, self.source, (self.clock)(), &attributes)
                .await?;
        }

        Ok(RecordPropagation {
            record_id: record.id.clone(),
            attributes,
            dispatched: !self.dry_run,
        })
    }

    /// Set `status` for every record of one page with a single sink call.
    /// Returns whether the sink was called.
    pub async fn propagate_status_batch(
        &self,
        tenant: Option<&str>,
        record_ids: &[String],
        status: DeviceStatus,
    ) -> PropagationResult<bool> {
        if self.dry_run || record_ids.is_empty() {
            return Ok(false);
        }

        self.sink.set_status(tenant, record_ids, status).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PropagationError;
    use crate::testing::{RecordingSink, SinkCall};
    use serde_json::json;

    fn fixed_clock() -> i64 {
        1_600_000_000_000
    }

    fn record() -> Record {
        Record::new("dev-1", DeviceStatus::Accepted)
            .with_identity("sn", json!("0001"))
            .with_identity("mac", json!("00:11"))
    }

    #[tokio::test]
    async fn test_propagate_upserts_sorted_attributes() {
        let sink = RecordingSink::new();
        let propagator = RecordPropagator::new(&sink, "deviceauth", false).with_clock(fixed_clock);

        let result = propagator.propagate(&record(), Some("acme")).await.unwrap();

        assert!(result.dispatched);
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Upsert {
                record_id: "dev-1".to_string(),
                tenant: Some("acme".to_string()),
                source: "deviceauth".to_string(),
                timestamp_millis: 1_600_000_000_000,
                attributes: vec![
                    Attribute::new("mac", "identity", "\"00:11\""),
                    Attribute::new("sn", "identity", "\"0001\""),
                ],
            }]
        );
    }

    #[tokio::test]
    async fn test_dry_run_maps_without_calling_sink() {
        let sink = RecordingSink::new();
        let propagator = RecordPropagator::new(&sink, "deviceauth", true);

        let result = propagator.propagate(&record(), None).await.unwrap();

        assert!(!result.dispatched);
        assert_eq!(result.attributes.len(), 2);
        assert!(sink.calls().is_empty());

        let sent = propagator
            .propagate_status_batch(None, &["dev-1".to_string()], DeviceStatus::Accepted)
            .await
            .unwrap();
        assert!(!sent);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported() {
        let sink = RecordingSink::new().reject_record("dev-1");
        let propagator = RecordPropagator::new(&sink, "deviceauth", false);

        let err = propagator.propagate(&record(), None).await.unwrap_err();
        assert!(matches!(err, PropagationError::SinkRejected { .. }));
    }

    #[tokio::test]
    async fn test_status_batch_is_one_call() {
        let sink = RecordingSink::new();
        let propagator = RecordPropagator::new(&sink, "deviceauth", false);
        let ids: Vec<String> = (0..3).map(|i| format!("dev-{i}")).collect();

        let sent = propagator
            .propagate_status_batch(Some("acme"), &ids, DeviceStatus::Rejected)
            .await
            .unwrap();

        assert!(sent);
        assert_eq!(
            sink.calls(),
            vec![SinkCall::SetStatus {
                tenant: Some("acme".to_string()),
                record_ids: ids,
                status: DeviceStatus::Rejected,
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_status_batch_is_not_sent() {
        let sink = RecordingSink::new();
        let propagator = RecordPropagator::new(&sink, "deviceauth", false);

        let sent = propagator
            .propagate_status_batch(None, &[], DeviceStatus::Pending)
            .await
            .unwrap();
        assert!(!sent);
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_clock_reads_current_time() {
        let before = Utc::now().timestamp_millis();
        let now = now_unix_millis();
        assert!(now >= before);
    }
}
