//! # Propagation Error Types
//!
//! Structured error handling for the propagation engine using thiserror.
//!
//! The variants mirror the failure taxonomy of a propagation run:
//! store failures abort the current tenant store pass, encoding and sink
//! failures only cost a single record or page, and `StoresFailed` is the
//! aggregate a run reports when at least one tenant store had failures.

use crate::config::ConfigurationError;
use crate::models::TenantStoreId;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropagationError {
    #[error("Record store unavailable: {operation}: {message}")]
    StoreUnavailable { operation: String, message: String },

    #[error("Failed to encode attribute {attribute}: {message}")]
    Encoding { attribute: String, message: String },

    #[error("Attribute sink unavailable: {message}")]
    SinkUnavailable { message: String },

    #[error("Attribute sink rejected request: {message}")]
    SinkRejected { message: String },

    #[error("Invalid checkpoint version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Propagation failed for {count} tenant store(s)", count = .failures.len())]
    StoresFailed {
        failures: BTreeMap<TenantStoreId, Vec<String>>,
    },
}

impl PropagationError {
    pub fn store_unavailable(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn sink_unavailable(message: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            message: message.into(),
        }
    }

    pub fn sink_rejected(message: impl Into<String>) -> Self {
        Self::SinkRejected {
            message: message.into(),
        }
    }

    /// Whether this failure ends the pass over the current tenant store.
    ///
    /// Only store failures do; everything else is contained to the record
    /// or page being propagated.
    pub fn is_store_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }

    /// Whether the failure originated at the attribute sink
    pub fn is_sink_failure(&self) -> bool {
        matches!(
            self,
            Self::SinkUnavailable { .. } | Self::SinkRejected { .. }
        )
    }
}

impl From<sqlx::Error> for PropagationError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreUnavailable {
            operation: "database".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigurationError> for PropagationError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration {
            message: err.to_string(),
        }
    }
}

pub type PropagationResult<T> = Result<T, PropagationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fatal_classification() {
        assert!(
            PropagationError::store_unavailable("get_page", "connection reset").is_store_fatal()
        );
        assert!(!PropagationError::sink_unavailable("timeout").is_store_fatal());
        assert!(!PropagationError::Encoding {
            attribute: "mac".to_string(),
            message: "bad value".to_string(),
        }
        .is_store_fatal());
    }

    #[test]
    fn test_sink_failure_classification() {
        assert!(PropagationError::sink_unavailable("503").is_sink_failure());
        assert!(PropagationError::sink_rejected("400").is_sink_failure());
        assert!(!PropagationError::store_unavailable("list", "down").is_sink_failure());
    }

    #[test]
    fn test_sqlx_errors_are_store_failures() {
        let err = PropagationError::from(sqlx::Error::PoolClosed);
        assert!(err.is_store_fatal());
        assert!(matches!(
            err,
            PropagationError::StoreUnavailable { ref operation, .. } if operation == "database"
        ));
    }

    #[test]
    fn test_stores_failed_message_counts_stores() {
        let mut failures = BTreeMap::new();
        failures.insert(
            TenantStoreId::for_tenant("deviceauth", "t1"),
            vec!["boom".to_string()],
        );
        failures.insert(
            TenantStoreId::for_tenant("deviceauth", "t2"),
            vec!["boom".to_string(), "again".to_string()],
        );

        let err = PropagationError::StoresFailed { failures };
        assert_eq!(err.to_string(), "Propagation failed for 2 tenant store(s)");
    }
}
