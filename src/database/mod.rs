//! # Database Operations
//!
//! Connection pooling for the Postgres-backed record store.
//!
//! - [`connection`] - Pool creation from [`crate::config::DatabaseConfig`]
//!   and connectivity checks

pub mod connection;

pub use connection::DatabaseConnection;
