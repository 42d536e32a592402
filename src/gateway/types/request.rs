//! Request bodies and query strings

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// POST /account
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "alice")]
    pub owner: String,
    /// One of USD, EUR, VND
    #[schema(example = "USD")]
    pub currency: String,
}

/// POST /transfers
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct TransferRequest {
    #[schema(example = 1)]
    pub from_account_id: i64,
    #[schema(example = 2)]
    pub to_account_id: i64,
    /// Smallest currency unit, must be positive
    #[schema(example = 500)]
    pub amount: i64,
}

/// 1-based page window shared by every list endpoint
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, starting at 1
    pub page_id: Option<i64>,
    /// Records per page
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Missing values fall back to the first page of `default_page_size` records.
    pub fn resolve(&self, default_page_size: i64) -> (i64, i64) {
        (
            self.page_id.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size),
        )
    }
}
