#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Inventory Propagation
//!
//! Operational propagation of device identity data into an inventory
//! service for a multi-tenant device-identity store.
//!
//! ## Overview
//!
//! A run walks every tenant's device records in bounded batches and pushes
//! derived attributes (identity fields or lifecycle status) to the
//! inventory service. Failures on single records, pages or tenant stores
//! are contained and reported per store; a dry run performs every read and
//! mapping step without writing anything to the inventory service.
//!
//! ## Module Organization
//!
//! - [`propagation`] - Orchestrator, tenant selection, pagination, mapping
//! - [`store`] - Record store contract and its Postgres implementation
//! - [`sink`] - Attribute sink contract (inventory service)
//! - [`models`] - Records, attributes, tenant store ids, checkpoint versions
//! - [`config`] - Layered YAML/environment configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//! - `testing` - In-memory collaborators for tests (`test-utils` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inventory_propagation::config::ConfigManager;
//! use inventory_propagation::propagation::{
//!     PropagationMode, PropagationOrchestrator, PropagationRequest, PropagationSettings,
//! };
//! use inventory_propagation::sink::AttributeSink;
//! use inventory_propagation::store::PgRecordStore;
//! use std::sync::Arc;
//!
//! # async fn example(sink: Arc<dyn AttributeSink>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::load()?.into_config();
//! inventory_propagation::logging::init_structured_logging(&config.logging);
//!
//! let store = PgRecordStore::connect(&config).await?;
//! let orchestrator = PropagationOrchestrator::new(Arc::new(store), sink)
//!     .with_settings(PropagationSettings::from(&config));
//!
//! let request = PropagationRequest::new(PropagationMode::Statuses)
//!     .with_checkpoint_version("1.2.0")
//!     .dry_run(true);
//! let outcome = orchestrator.run(&request).await?;
//! println!("{} records would be propagated", outcome.total_records_propagated());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod propagation;
pub mod sink;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use crate::config::{ConfigManager, PropagationConfig};
pub use error::{PropagationError, PropagationResult};
pub use models::{Attribute, DeviceStatus, MigrationVersion, Record, TenantStoreId};
pub use propagation::{
    PropagationMode, PropagationOrchestrator, PropagationOutcome, PropagationRequest,
    PropagationSettings,
};
pub use sink::AttributeSink;
pub use store::{RecordFilter, RecordStore};
