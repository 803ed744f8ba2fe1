//! # Propagation Orchestrator
//!
//! Entry point of a propagation run. Resolves the tenant stores, runs one
//! pass per store in order and folds the per-store reports into a
//! [`PropagationOutcome`].
//!
//! Failure containment:
//!
//! - a record that cannot be mapped or upserted is skipped for this run
//! - a status page the sink refuses is skipped, the sweep continues
//! - a store failure ends that store's pass; the next store still runs
//! - only a failing tenant discovery aborts the whole run
//!
//! A checkpoint is written after a status pass only when the pass had no
//! failures, a version label was given and the run is not a dry run.

use super::observer::{PropagationObserver, TracingObserver};
use super::outcome::{CheckpointOutcome, FailureScope, PassFailure, PropagationOutcome, StoreReport};
use super::paginator::BatchPaginator;
use super::propagator::{now_unix_millis, RecordPropagator};
use super::tenant_selector::TenantSelector;
use super::{PropagationMode, PropagationRequest, PropagationSettings};
use crate::error::{PropagationError, PropagationResult};
use crate::logging::log_error;
use crate::models::{DeviceStatus, MigrationVersion, TenantStoreId};
use crate::sink::AttributeSink;
use crate::store::{RecordFilter, RecordStore};
use std::sync::Arc;
use tracing::{debug, info};

pub struct PropagationOrchestrator {
    store: Arc<dyn RecordStore>,
    sink: Arc<dyn AttributeSink>,
    observer: Arc<dyn PropagationObserver>,
    settings: PropagationSettings,
    clock: fn() -> i64,
}

impl PropagationOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>, sink: Arc<dyn AttributeSink>) -> Self {
        Self {
            store,
            sink,
            observer: Arc::new(TracingObserver),
            settings: PropagationSettings::default(),
            clock: now_unix_millis,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PropagationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_settings(mut self, settings: PropagationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Timestamp source for attribute upserts
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &PropagationSettings {
        &self.settings
    }

    /// Tenants owning a store, as discovered from the record store
    pub async fn list_tenants(&self) -> PropagationResult<Vec<String>> {
        TenantSelector::new(self.store.as_ref(), &self.settings.store_base_name)
            .list_tenants()
            .await
    }

    /// Run and fold the outcome into a result: `Ok` only when every store
    /// pass was failure-free, otherwise
    /// [`PropagationError::StoresFailed`] naming each failed store.
    pub async fn run(&self, request: &PropagationRequest) -> PropagationResult<PropagationOutcome> {
        self.run_to_outcome(request).await?.into_result()
    }

    /// Run and return every store's report. Fails only when tenant
    /// discovery fails, in which case no store was touched.
    pub async fn run_to_outcome(
        &self,
        request: &PropagationRequest,
    ) -> PropagationResult<PropagationOutcome> {
        let selector = TenantSelector::new(self.store.as_ref(), &self.settings.store_base_name);
        let stores = match selector.select(request.tenant.as_deref()).await {
            Ok(stores) => stores,
            Err(error) => {
                log_error(
                    "propagation_orchestrator",
                    "select_tenant_stores",
                    &error.to_string(),
                    Some("aborting"),
                );
                return Err(error);
            }
        };

        let propagator =
            RecordPropagator::new(self.sink.as_ref(), &self.settings.source_label, request.dry_run)
                .with_clock(self.clock);

        let mut reports = Vec::with_capacity(stores.len());
        for store in stores {
            self.observer.store_started(&store, request.mode, request.dry_run);

            let mut report = StoreReport::new(store, request.mode, request.dry_run);
            match request.mode {
                PropagationMode::FullListing | PropagationMode::IdentityData => {
                    let batch_size = self.settings.batch_size(request.mode);
                    self.propagate_records(&mut report, &propagator, batch_size).await;
                }
                PropagationMode::Statuses => {
                    self.propagate_statuses(&mut report, &propagator).await;
                    self.checkpoint(&mut report, request).await;
                }
            }

            self.observer.store_finished(&report);
            reports.push(report);
        }

        info!(stores = reports.len(), mode = %request.mode, "All stores processed");

        Ok(PropagationOutcome {
            mode: request.mode,
            dry_run: request.dry_run,
            stores: reports,
        })
    }

    /// One upsert per record over the whole store
    async fn propagate_records(
        &self,
        report: &mut StoreReport,
        propagator: &RecordPropagator<'_>,
        batch_size: u64,
    ) {
        let store_id = report.store.clone();
        let tenant = store_id.tenant();
        let mut paginator =
            BatchPaginator::new(self.store.as_ref(), &store_id, RecordFilter::all(), batch_size);

        loop {
            let page = match paginator.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(error) => {
                    report.aborted = true;
                    self.record_failure(report, FailureScope::Store, error);
                    break;
                }
            };
            report.records_visited += page.len();

            for record in &page {
                debug!(store = %store_id, record_id = %record.id, "Propagating record");
                match propagator.propagate(record, tenant).await {
                    Ok(propagation) => {
                        report.records_propagated += 1;
                        if propagation.dispatched {
                            report.sink_calls += 1;
                        }
                        self.observer.record_propagated(
                            &store_id,
                            &record.id,
                            &propagation.attributes,
                            propagator.is_dry_run(),
                        );
                    }
                    Err(error) => {
                        let scope = FailureScope::Record {
                            record_id: record.id.clone(),
                        };
                        self.record_failure(report, scope, error);
                    }
                }
            }
        }

        report.pages_fetched += paginator.pages_fetched();
    }

    /// One independent sweep per status value, one status call per page
    async fn propagate_statuses(
        &self,
        report: &mut StoreReport,
        propagator: &RecordPropagator<'_>,
    ) {
        let store_id = report.store.clone();
        let tenant = store_id.tenant();

        for status in DeviceStatus::ALL {
            let failures_before = report.failures.len();
            let aborted = self
                .sweep_status(report, propagator, &store_id, tenant, status)
                .await;

            self.observer
                .status_sweep_finished(&store_id, status, report.failures.len() - failures_before);

            if aborted {
                report.aborted = true;
                break;
            }
        }
    }

    /// Returns whether the store failed and the pass must stop
    async fn sweep_status(
        &self,
        report: &mut StoreReport,
        propagator: &RecordPropagator<'_>,
        store_id: &TenantStoreId,
        tenant: Option<&str>,
        status: DeviceStatus,
    ) -> bool {
        let mut paginator = BatchPaginator::new(
            self.store.as_ref(),
            store_id,
            RecordFilter::with_status(status),
            self.settings.status_batch_size,
        );

        let mut aborted = false;
        loop {
            let offset = paginator.offset();
            let page = match paginator.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(error) => {
                    self.record_failure(report, FailureScope::Store, error);
                    aborted = true;
                    break;
                }
            };
            report.records_visited += page.len();

            let record_ids: Vec<String> = page.into_iter().map(|record| record.id).collect();
            match propagator
                .propagate_status_batch(tenant, &record_ids, status)
                .await
            {
                Ok(sent) => {
                    report.records_propagated += record_ids.len();
                    if sent {
                        report.sink_calls += 1;
                    }
                    self.observer.status_batch_propagated(
                        store_id,
                        status,
                        &record_ids,
                        propagator.is_dry_run(),
                    );
                }
                Err(error) => {
                    self.record_failure(report, FailureScope::Page { status, offset }, error);
                }
            }
        }

        report.pages_fetched += paginator.pages_fetched();
        aborted
    }

    async fn checkpoint(&self, report: &mut StoreReport, request: &PropagationRequest) {
        let Some(label) = request
            .checkpoint_version
            .as_deref()
            .filter(|label| !label.is_empty())
        else {
            report.checkpoint = CheckpointOutcome::NotRequested;
            return;
        };

        if request.dry_run {
            report.checkpoint = CheckpointOutcome::SkippedDryRun;
            self.observer
                .checkpoint_skipped(&report.store, label, &report.checkpoint);
            return;
        }

        if !report.is_success() {
            report.checkpoint = CheckpointOutcome::SkippedFailures;
            self.observer
                .checkpoint_skipped(&report.store, label, &report.checkpoint);
            return;
        }

        let version = match MigrationVersion::parse(label) {
            Ok(version) => version,
            Err(error) => {
                report.checkpoint = CheckpointOutcome::InvalidVersion;
                self.observer
                    .checkpoint_skipped(&report.store, label, &report.checkpoint);
                self.record_failure(report, FailureScope::Checkpoint, error);
                return;
            }
        };

        match self.store.write_checkpoint(&report.store, &version).await {
            Ok(()) => {
                report.checkpoint = CheckpointOutcome::Written(version);
                self.observer.checkpoint_written(&report.store, &version);
            }
            Err(error) => {
                report.checkpoint = CheckpointOutcome::WriteFailed;
                self.record_failure(report, FailureScope::Checkpoint, error);
            }
        }
    }

    fn record_failure(
        &self,
        report: &mut StoreReport,
        scope: FailureScope,
        error: PropagationError,
    ) {
        let failure = PassFailure::new(scope, error);
        self.observer.failure(&report.store, &failure);
        report.failures.push(failure);
    }
}
