//! Ledger record types and statement parameters
//!
//! Balances and amounts are signed 64-bit integers in the smallest currency unit
//! (cents, dong, ...). No floating point anywhere.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::StoreError;

// ============================================================================
// Currency
// ============================================================================

/// Supported account currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Vnd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Eur, Currency::Vnd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Vnd => "VND",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a currency code is not one of [`Currency::ALL`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported currency: {0}")]
pub struct UnsupportedCurrency(pub String);

impl FromStr for Currency {
    type Err = UnsupportedCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "VND" => Ok(Currency::Vnd),
            other => Err(UnsupportedCurrency(other.to_string())),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// A monetary account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Account {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "alice")]
    pub owner: String,
    /// Current balance in the smallest currency unit
    #[schema(example = 10000)]
    pub balance: i64,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

/// Immutable audit record of one balance change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Entry {
    pub id: i64,
    pub account_id: i64,
    /// Positive = credit, negative = debit
    #[schema(example = -500)]
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Money moved from one account to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transfer {
    pub id: i64,
    pub from_account_id: i64,
    pub to_account_id: i64,
    #[schema(example = 500)]
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Statement parameters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountParams {
    pub owner: String,
    pub balance: i64,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateAccountParams {
    pub id: i64,
    pub balance: i64,
}

/// `balance := balance + amount` on one account row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddAccountBalanceParams {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateEntryParams {
    pub account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateEntryParams {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransferParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateTransferParams {
    pub id: i64,
    pub amount: i64,
}

/// Page window for list queries (ordered by id ascending)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListParams {
    limit: i64,
    offset: i64,
}

impl ListParams {
    /// `limit` must be positive and `offset` non-negative.
    pub fn new(limit: i64, offset: i64) -> Result<Self, StoreError> {
        if limit <= 0 || offset < 0 {
            return Err(StoreError::InvalidPage { limit, offset });
        }
        Ok(Self { limit, offset })
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

// ============================================================================
// Transfer protocol
// ============================================================================

/// Input of one atomic transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferTxParams {
    pub from_account_id: i64,
    pub to_account_id: i64,
    /// Quantity moved; direction is implied by from/to
    pub amount: i64,
}

impl TransferTxParams {
    /// The two account ids in lock-acquisition order (ascending).
    pub fn lock_order(&self) -> (i64, i64) {
        if self.from_account_id < self.to_account_id {
            (self.from_account_id, self.to_account_id)
        } else {
            (self.to_account_id, self.from_account_id)
        }
    }
}

/// Everything one committed transfer produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferTxResult {
    pub transfer: Transfer,
    pub from_entry: Entry,
    pub to_entry: Entry,
    pub from_account: Account,
    pub to_account: Account,
}
