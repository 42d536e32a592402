//! Ledger facade error taxonomy
//!
//! Three categories, mapped by the gateway to client error, not-found and server error.

use thiserror::Error;

use crate::store::StoreError;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed or semantically invalid input; detected before any mutation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced record does not exist (miss, or a foreign key violation).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Connectivity, lock timeout, commit failure or any other store-side fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        LedgerError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        LedgerError::Internal(msg.into())
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidArgument(_) => "INVALID_ARGUMENT",
            LedgerError::NotFound(_) => "NOT_FOUND",
            LedgerError::Internal(_) => "INTERNAL",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::InvalidArgument(_) => 400,
            LedgerError::NotFound(_) => 404,
            LedgerError::Internal(_) => 500,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => LedgerError::not_found("record not found"),
            StoreError::ForeignKeyViolation(constraint) => {
                LedgerError::not_found(format!("referenced account not found ({})", constraint))
            }
            StoreError::InvalidPage { .. } => LedgerError::invalid(e.to_string()),
            StoreError::OutOfRange(_)
            | StoreError::LockTimeout
            | StoreError::Deadlock
            | StoreError::Decode(_)
            | StoreError::Unavailable(_)
            | StoreError::Database(_) => LedgerError::internal(e.to_string()),
        }
    }
}
