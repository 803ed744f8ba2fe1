//! # Testing Doubles
//!
//! In-memory implementations of the propagation collaborators with call
//! recording and failure injection, for unit tests and for downstream
//! crates exercising the engine without a database or inventory service.
//! Available to other crates with the `test-utils` feature.

use crate::error::{PropagationError, PropagationResult};
use crate::models::{Attribute, DeviceStatus, MigrationVersion, Record, TenantStoreId};
use crate::propagation::observer::PropagationObserver;
use crate::propagation::outcome::{CheckpointOutcome, PassFailure, StoreReport};
use crate::propagation::PropagationMode;
use crate::sink::AttributeSink;
use crate::store::{RecordFilter, RecordStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// `count` records with ids `"{prefix}-0000"`, `"{prefix}-0001"`, ...
pub fn numbered_records(prefix: &str, count: usize, status: DeviceStatus) -> Vec<Record> {
    (0..count)
        .map(|i| Record::new(format!("{prefix}-{i:04}"), status))
        .collect()
}

/// One `get_page` call as seen by [`InMemoryRecordStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub store: TenantStoreId,
    pub offset: u64,
    pub limit: u64,
    pub filter: RecordFilter,
}

/// Record store backed by vectors, preserving insertion order
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: HashMap<TenantStoreId, Vec<Record>>,
    discoverable: Vec<TenantStoreId>,
    fail_discovery: bool,
    failing_pages: HashSet<TenantStoreId>,
    failing_checkpoints: HashSet<TenantStoreId>,
    page_requests: Mutex<Vec<PageRequest>>,
    checkpoints: Mutex<Vec<(TenantStoreId, MigrationVersion)>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a store that tenant discovery reports
    pub fn with_tenant_store(mut self, store: TenantStoreId, records: Vec<Record>) -> Self {
        if !self.discoverable.contains(&store) {
            self.discoverable.push(store.clone());
        }
        self.records.insert(store, records);
        self
    }

    /// Add records to a store that discovery does not report, such as the
    /// default store
    pub fn with_records(mut self, store: TenantStoreId, records: Vec<Record>) -> Self {
        self.records.insert(store, records);
        self
    }

    pub fn fail_discovery(mut self) -> Self {
        self.fail_discovery = true;
        self
    }

    pub fn fail_pages_for(mut self, store: TenantStoreId) -> Self {
        self.failing_pages.insert(store);
        self
    }

    pub fn fail_checkpoints_for(mut self, store: TenantStoreId) -> Self {
        self.failing_checkpoints.insert(store);
        self
    }

    pub fn page_requests(&self) -> Vec<PageRequest> {
        self.page_requests.lock().clone()
    }

    pub fn checkpoints(&self) -> Vec<(TenantStoreId, MigrationVersion)> {
        self.checkpoints.lock().clone()
    }

    pub fn checkpoints_for(&self, store: &TenantStoreId) -> Vec<MigrationVersion> {
        self.checkpoints
            .lock()
            .iter()
            .filter(|(s, _)| s == store)
            .map(|(_, version)| *version)
            .collect()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list_tenant_stores(&self) -> PropagationResult<Vec<TenantStoreId>> {
        if self.fail_discovery {
            return Err(PropagationError::store_unavailable(
                "list_tenant_stores",
                "simulated discovery failure",
            ));
        }
        Ok(self.discoverable.clone())
    }

    async fn get_page(
        &self,
        store: &TenantStoreId,
        offset: u64,
        limit: u64,
        filter: &RecordFilter,
    ) -> PropagationResult<Vec<Record>> {
        self.page_requests.lock().push(PageRequest {
            store: store.clone(),
            offset,
            limit,
            filter: *filter,
        });

        if self.failing_pages.contains(store) {
            return Err(PropagationError::store_unavailable(
                "get_page",
                format!("simulated failure for {store}"),
            ));
        }

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(self
            .records
            .get(store)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matches(record))
                    .skip(offset)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn write_checkpoint(
        &self,
        store: &TenantStoreId,
        version: &MigrationVersion,
    ) -> PropagationResult<()> {
        if self.failing_checkpoints.contains(store) {
            return Err(PropagationError::store_unavailable(
                "write_checkpoint",
                format!("simulated failure for {store}"),
            ));
        }
        self.checkpoints.lock().push((store.clone(), *version));
        Ok(())
    }
}

/// One successful call received by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Upsert {
        record_id: String,
        tenant: Option<String>,
        source: String,
        timestamp_millis: i64,
        attributes: Vec<Attribute>,
    },
    SetStatus {
        tenant: Option<String>,
        record_ids: Vec<String>,
        status: DeviceStatus,
    },
}

/// Attribute sink that records accepted calls
#[derive(Debug, Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    failed_attempts: Mutex<usize>,
    unavailable_tenants: HashSet<String>,
    rejected_records: HashSet<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call for `tenant` fails with `SinkUnavailable`
    pub fn fail_for_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.unavailable_tenants.insert(tenant.into());
        self
    }

    /// Every call touching `record_id` fails with `SinkRejected`
    pub fn reject_record(mut self, record_id: impl Into<String>) -> Self {
        self.rejected_records.insert(record_id.into());
        self
    }

    /// Accepted calls in arrival order
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().clone()
    }

    pub fn failed_attempts(&self) -> usize {
        *self.failed_attempts.lock()
    }

    fn check(&self, tenant: Option<&str>, record_ids: &[&str]) -> PropagationResult<()> {
        let failure = if tenant.is_some_and(|t| self.unavailable_tenants.contains(t)) {
            Some(PropagationError::sink_unavailable(format!(
                "simulated outage for tenant {}",
                tenant.unwrap_or_default()
            )))
        } else {
            record_ids
                .iter()
                .find(|id| self.rejected_records.contains(**id))
                .map(|id| PropagationError::sink_rejected(format!("simulated rejection of {id}")))
        };

        match failure {
            Some(error) => {
                *self.failed_attempts.lock() += 1;
                Err(error)
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AttributeSink for RecordingSink {
    async fn upsert_attributes(
        &self,
        record_id: &str,
        tenant: Option<&str>,
        source: &str,
        timestamp_millis: i64,
        attributes: &[Attribute],
    ) -> PropagationResult<()> {
        self.check(tenant, &[record_id])?;
        self.calls.lock().push(SinkCall::Upsert {
            record_id: record_id.to_string(),
            tenant: tenant.map(str::to_string),
            source: source.to_string(),
            timestamp_millis,
            attributes: attributes.to_vec(),
        });
        Ok(())
    }

    async fn set_status(
        &self,
        tenant: Option<&str>,
        record_ids: &[String],
        status: DeviceStatus,
    ) -> PropagationResult<()> {
        let ids: Vec<&str> = record_ids.iter().map(String::as_str).collect();
        self.check(tenant, &ids)?;
        self.calls.lock().push(SinkCall::SetStatus {
            tenant: tenant.map(str::to_string),
            record_ids: record_ids.to_vec(),
            status,
        });
        Ok(())
    }
}

/// One observer callback as seen by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    StoreStarted {
        store: TenantStoreId,
        mode: PropagationMode,
        dry_run: bool,
    },
    RecordPropagated {
        store: TenantStoreId,
        record_id: String,
        attributes: Vec<Attribute>,
        dry_run: bool,
    },
    StatusBatchPropagated {
        store: TenantStoreId,
        status: DeviceStatus,
        record_ids: Vec<String>,
        dry_run: bool,
    },
    StatusSweepFinished {
        store: TenantStoreId,
        status: DeviceStatus,
        failures: usize,
    },
    Failure {
        store: TenantStoreId,
        message: String,
    },
    CheckpointWritten {
        store: TenantStoreId,
        version: MigrationVersion,
    },
    CheckpointSkipped {
        store: TenantStoreId,
        label: String,
        outcome: CheckpointOutcome,
    },
    StoreFinished {
        store: TenantStoreId,
        success: bool,
    },
}

/// Observer collecting every callback in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().push(event);
    }
}

impl PropagationObserver for RecordingObserver {
    fn store_started(&self, store: &TenantStoreId, mode: PropagationMode, dry_run: bool) {
        self.push(ObservedEvent::StoreStarted {
            store: store.clone(),
            mode,
            dry_run,
        });
    }

    fn record_propagated(
        &self,
        store: &TenantStoreId,
        record_id: &str,
        attributes: &[Attribute],
        dry_run: bool,
    ) {
        self.push(ObservedEvent::RecordPropagated {
            store: store.clone(),
            record_id: record_id.to_string(),
            attributes: attributes.to_vec(),
            dry_run,
        });
    }

    fn status_batch_propagated(
        &self,
        store: &TenantStoreId,
        status: DeviceStatus,
        record_ids: &[String],
        dry_run: bool,
    ) {
        self.push(ObservedEvent::StatusBatchPropagated {
            store: store.clone(),
            status,
            record_ids: record_ids.to_vec(),
            dry_run,
        });
    }

    fn status_sweep_finished(&self, store: &TenantStoreId, status: DeviceStatus, failures: usize) {
        self.push(ObservedEvent::StatusSweepFinished {
            store: store.clone(),
            status,
            failures,
        });
    }

    fn failure(&self, store: &TenantStoreId, failure: &PassFailure) {
        self.push(ObservedEvent::Failure {
            store: store.clone(),
            message: failure.to_string(),
        });
    }

    fn checkpoint_written(&self, store: &TenantStoreId, version: &MigrationVersion) {
        self.push(ObservedEvent::CheckpointWritten {
            store: store.clone(),
            version: *version,
        });
    }

    fn checkpoint_skipped(&self, store: &TenantStoreId, label: &str, outcome: &CheckpointOutcome) {
        self.push(ObservedEvent::CheckpointSkipped {
            store: store.clone(),
            label: label.to_string(),
            outcome: outcome.clone(),
        });
    }

    fn store_finished(&self, report: &StoreReport) {
        self.push(ObservedEvent::StoreFinished {
            store: report.store.clone(),
            success: report.is_success(),
        });
    }
}
