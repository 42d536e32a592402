//! Repository-level error types
//!
//! Every store backend reports failures through [`StoreError`]. PostgreSQL errors are
//! classified by SQLSTATE so the facade can tell a missing account apart from a lock
//! wait that ran out of time.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// SQLSTATE `foreign_key_violation`
const FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE `lock_not_available` (raised when `lock_timeout` elapses)
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE `deadlock_detected`
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE `numeric_value_out_of_range`
const NUMERIC_OUT_OF_RANGE: &str = "22003";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("Invalid page: limit={limit}, offset={offset}")]
    InvalidPage { limit: i64, offset: i64 },

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Lock wait timeout exceeded")]
    LockTimeout,

    #[error("Deadlock detected")]
    Deadlock,

    #[error("Corrupt row: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => return StoreError::NotFound,
            sqlx::Error::PoolTimedOut => {
                return StoreError::Unavailable("connection pool timed out".to_string());
            }
            sqlx::Error::PoolClosed => {
                return StoreError::Unavailable("connection pool closed".to_string());
            }
            _ => {}
        }

        if let Some(db_err) = err.as_database_error() {
            match db_err.code().as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("foreign key");
                    return StoreError::ForeignKeyViolation(constraint.to_string());
                }
                Some(LOCK_NOT_AVAILABLE) => return StoreError::LockTimeout,
                Some(DEADLOCK_DETECTED) => return StoreError::Deadlock,
                Some(NUMERIC_OUT_OF_RANGE) => {
                    return StoreError::OutOfRange(db_err.message().to_string());
                }
                _ => {}
            }
        }

        StoreError::Database(err)
    }
}
