//! HTTP handlers, one module per resource

pub mod account;
pub mod entry;
pub mod health;
pub mod transfer;

pub use account::{create_account, delete_account, get_account, list_accounts};
pub use entry::{get_entry, list_entries};
pub use health::{HealthResponse, health_check};
pub use transfer::{create_transfer, get_transfer, list_transfers};
