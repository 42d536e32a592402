//! Ledger Store
//!
//! Accounts, their debit/credit entries, and atomic transfers between accounts.
//!
//! # Modules
//!
//! - [`models`] - Account, Entry, Transfer and statement parameters
//! - [`store`] - Repository traits, `exec_tx`, in-process backend
//! - [`db`] - PostgreSQL backend (pool, schema, SQL statements)
//! - [`transfer`] - Transfer engine (lock-ordered atomic transfers)
//! - [`service`] - Service facade: validation and error taxonomy
//! - [`gateway`] - axum HTTP API
//! - [`config`] / [`logging`] - YAML config and tracing setup

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::{AppConfig, DatabaseConfig, GatewayConfig, LedgerConfig};
pub use db::{Database, PgStore};
pub use error::{LedgerError, LedgerResult};
pub use models::{Account, Currency, Entry, Transfer, TransferTxParams, TransferTxResult};
pub use service::{LedgerApi, LedgerService};
pub use store::{MemoryStore, Queries, Store, StoreError, UnitOfWork, exec_tx};
pub use transfer::TransferEngine;
