//! # Propagation Observer
//!
//! Side channel through which a run reports progress: which records were
//! (or under dry-run would have been) propagated, which failures were
//! contained, and what happened to checkpoints. [`TracingObserver`] turns
//! every callback into a structured `tracing` event and is the default.

use super::outcome::{CheckpointOutcome, PassFailure, StoreReport};
use super::PropagationMode;
use crate::constants::events;
use crate::models::{Attribute, DeviceStatus, MigrationVersion, TenantStoreId};
use tracing::{error, info, warn};

/// Receives progress callbacks from the orchestrator. All methods default
/// to doing nothing.
pub trait PropagationObserver: Send + Sync {
    fn store_started(&self, _store: &TenantStoreId, _mode: PropagationMode, _dry_run: bool) {}

    /// One record's attributes were upserted, or would have been under
    /// dry-run
    fn record_propagated(
        &self,
        _store: &TenantStoreId,
        _record_id: &str,
        _attributes: &[Attribute],
        _dry_run: bool,
    ) {
    }

    /// One page of record ids had its status set, or would have under
    /// dry-run
    fn status_batch_propagated(
        &self,
        _store: &TenantStoreId,
        _status: DeviceStatus,
        _record_ids: &[String],
        _dry_run: bool,
    ) {
    }

    /// A full sweep over one status value ended
    fn status_sweep_finished(
        &self,
        _store: &TenantStoreId,
        _status: DeviceStatus,
        _failures: usize,
    ) {
    }

    fn failure(&self, _store: &TenantStoreId, _failure: &PassFailure) {}

    fn checkpoint_written(&self, _store: &TenantStoreId, _version: &MigrationVersion) {}

    fn checkpoint_skipped(
        &self,
        _store: &TenantStoreId,
        _label: &str,
        _outcome: &CheckpointOutcome,
    ) {
    }

    fn store_finished(&self, _report: &StoreReport) {}
}

/// Logs every callback through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PropagationObserver for TracingObserver {
    fn store_started(&self, store: &TenantStoreId, mode: PropagationMode, dry_run: bool) {
        info!(
            event = events::STORE_STARTED,
            store = %store,
            tenant = store.tenant(),
            mode = %mode,
            dry_run,
            "Propagating inventory from store"
        );
    }

    fn record_propagated(
        &self,
        store: &TenantStoreId,
        record_id: &str,
        attributes: &[Attribute],
        dry_run: bool,
    ) {
        info!(
            event = events::RECORD_PROPAGATED,
            store = %store,
            record_id = %record_id,
            attributes = attributes.len(),
            dry_run,
            "{}",
            if dry_run { "Would propagate record" } else { "Propagated record" }
        );
    }

    fn status_batch_propagated(
        &self,
        store: &TenantStoreId,
        status: DeviceStatus,
        record_ids: &[String],
        dry_run: bool,
    ) {
        info!(
            event = events::STATUS_BATCH_PROPAGATED,
            store = %store,
            status = %status,
            records = record_ids.len(),
            dry_run,
            "{}",
            if dry_run { "Would set status for batch" } else { "Set status for batch" }
        );
    }

    fn status_sweep_finished(&self, store: &TenantStoreId, status: DeviceStatus, failures: usize) {
        if failures == 0 {
            info!(store = %store, status = %status, "Done with store status sweep");
        } else {
            warn!(
                store = %store,
                status = %status,
                failures,
                "Done with store status sweep, but there were errors"
            );
        }
    }

    fn failure(&self, store: &TenantStoreId, failure: &PassFailure) {
        error!(
            event = events::FAILURE,
            store = %store,
            scope = %failure.scope,
            error = %failure.error,
            "Propagation failure"
        );
    }

    fn checkpoint_written(&self, store: &TenantStoreId, version: &MigrationVersion) {
        info!(
            event = events::CHECKPOINT_WRITTEN,
            store = %store,
            version = %version,
            "Stored propagation checkpoint"
        );
    }

    fn checkpoint_skipped(&self, store: &TenantStoreId, label: &str, outcome: &CheckpointOutcome) {
        warn!(
            event = events::CHECKPOINT_SKIPPED,
            store = %store,
            version = %label,
            reason = outcome.skip_reason().unwrap_or("not applicable"),
            "Will not store propagation checkpoint"
        );
    }

    fn store_finished(&self, report: &StoreReport) {
        if report.is_success() {
            info!(
                event = events::STORE_FINISHED,
                store = %report.store,
                records = report.records_propagated,
                pages = report.pages_fetched,
                sink_calls = report.sink_calls,
                "Done with store"
            );
        } else {
            warn!(
                event = events::STORE_FINISHED,
                store = %report.store,
                records = report.records_propagated,
                failures = report.failures.len(),
                aborted = report.aborted,
                "Done with store, but there were errors"
            );
        }
    }
}
