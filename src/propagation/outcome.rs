//! # Propagation Outcome
//!
//! Per-store reports and the run-level aggregate. Failures are kept with the
//! store they happened in, so a failed run still says which stores failed
//! and why.

use super::PropagationMode;
use crate::error::{PropagationError, PropagationResult};
use crate::models::{DeviceStatus, MigrationVersion, TenantStoreId};
use std::collections::BTreeMap;
use std::fmt;

/// Where inside a store pass a failure happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureScope {
    /// One record could not be mapped or upserted; the pass moved on
    Record { record_id: String },
    /// One status page could not be sent; the pass moved on
    Page { status: DeviceStatus, offset: u64 },
    /// The store itself failed; the rest of the pass was abandoned
    Store,
    /// The checkpoint could not be recorded
    Checkpoint,
}

impl fmt::Display for FailureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record { record_id } => write!(f, "record {record_id}"),
            Self::Page { status, offset } => write!(f, "status={status} page at offset {offset}"),
            Self::Store => write!(f, "store"),
            Self::Checkpoint => write!(f, "checkpoint"),
        }
    }
}

#[derive(Debug)]
pub struct PassFailure {
    pub scope: FailureScope,
    pub error: PropagationError,
}

impl PassFailure {
    pub fn new(scope: FailureScope, error: PropagationError) -> Self {
        Self { scope, error }
    }
}

impl fmt::Display for PassFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.error)
    }
}

/// What happened to the checkpoint at the end of a store pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// No version label was supplied
    NotRequested,
    /// The mode does not write checkpoints
    NotApplicable,
    SkippedDryRun,
    /// The pass had failures, so the version was not recorded
    SkippedFailures,
    /// The supplied label is not a valid version
    InvalidVersion,
    Written(MigrationVersion),
    WriteFailed,
}

impl CheckpointOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written(_))
    }

    /// Human-readable reason for a checkpoint that was not written
    pub fn skip_reason(&self) -> Option<&'static str> {
        match self {
            Self::SkippedDryRun => Some("dry run"),
            Self::SkippedFailures => Some("errors during propagation"),
            Self::InvalidVersion => Some("bad version provided"),
            Self::WriteFailed => Some("checkpoint write failed"),
            Self::NotRequested | Self::NotApplicable | Self::Written(_) => None,
        }
    }
}

/// Result of one tenant store pass
#[derive(Debug)]
pub struct StoreReport {
    pub store: TenantStoreId,
    pub mode: PropagationMode,
    pub dry_run: bool,
    /// Records returned by the store during the pass
    pub records_visited: usize,
    /// Records (or status page members) propagated, or that would have been
    /// under dry-run
    pub records_propagated: usize,
    pub pages_fetched: usize,
    /// Sink calls that succeeded; always 0 under dry-run
    pub sink_calls: usize,
    pub failures: Vec<PassFailure>,
    /// The pass stopped early because the store failed
    pub aborted: bool,
    pub checkpoint: CheckpointOutcome,
}

impl StoreReport {
    pub fn new(store: TenantStoreId, mode: PropagationMode, dry_run: bool) -> Self {
        Self {
            store,
            mode,
            dry_run,
            records_visited: 0,
            records_propagated: 0,
            pages_fetched: 0,
            sink_calls: 0,
            failures: Vec::new(),
            aborted: false,
            checkpoint: CheckpointOutcome::NotApplicable,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregate over every store of a run, in processing order
#[derive(Debug)]
pub struct PropagationOutcome {
    pub mode: PropagationMode,
    pub dry_run: bool,
    pub stores: Vec<StoreReport>,
}

impl PropagationOutcome {
    pub fn is_success(&self) -> bool {
        self.stores.iter().all(StoreReport::is_success)
    }

    pub fn failed_stores(&self) -> impl Iterator<Item = &StoreReport> {
        self.stores.iter().filter(|report| !report.is_success())
    }

    /// Failure messages keyed by store, for failed stores only
    pub fn failure_summary(&self) -> BTreeMap<TenantStoreId, Vec<String>> {
        self.failed_stores()
            .map(|report| {
                (
                    report.store.clone(),
                    report.failures.iter().map(ToString::to_string).collect(),
                )
            })
            .collect()
    }

    pub fn report_for(&self, store: &TenantStoreId) -> Option<&StoreReport> {
        self.stores.iter().find(|report| &report.store == store)
    }

    pub fn total_records_propagated(&self) -> usize {
        self.stores.iter().map(|r| r.records_propagated).sum()
    }

    /// `Ok(self)` when every store succeeded, otherwise
    /// [`PropagationError::StoresFailed`].
    pub fn into_result(self) -> PropagationResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PropagationError::StoresFailed {
                failures: self.failure_summary(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(tenant: &str, failures: Vec<PassFailure>) -> StoreReport {
        let mut report = StoreReport::new(
            TenantStoreId::for_tenant("deviceauth", tenant),
            PropagationMode::Statuses,
            false,
        );
        report.failures = failures;
        report
    }

    #[test]
    fn test_outcome_success_requires_every_store() {
        let outcome = PropagationOutcome {
            mode: PropagationMode::Statuses,
            dry_run: false,
            stores: vec![report("a", vec![]), report("b", vec![])],
        };
        assert!(outcome.is_success());
        assert!(outcome.into_result().is_ok());
    }

    #[test]
    fn test_failure_summary_names_failed_stores() {
        let outcome = PropagationOutcome {
            mode: PropagationMode::Statuses,
            dry_run: false,
            stores: vec![
                report("a", vec![]),
                report(
                    "b",
                    vec![PassFailure::new(
                        FailureScope::Page {
                            status: DeviceStatus::Accepted,
                            offset: 512,
                        },
                        PropagationError::sink_unavailable("503"),
                    )],
                ),
            ],
        };

        match outcome.into_result() {
            Err(PropagationError::StoresFailed { failures }) => {
                assert_eq!(failures.len(), 1);
                let messages = &failures[&TenantStoreId::for_tenant("deviceauth", "b")];
                assert_eq!(
                    messages,
                    &vec!["status=accepted page at offset 512: Attribute sink unavailable: 503"
                        .to_string()]
                );
            }
            other => panic!("expected StoresFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_skip_reasons() {
        assert_eq!(
            CheckpointOutcome::SkippedFailures.skip_reason(),
            Some("errors during propagation")
        );
        assert_eq!(CheckpointOutcome::Written(MigrationVersion::new(1, 0, 0)).skip_reason(), None);
        assert!(CheckpointOutcome::Written(MigrationVersion::new(1, 0, 0)).is_written());
    }
}
