use std::sync::Arc;

use crate::service::LedgerApi;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Ledger facade; every handler goes through it
    pub ledger: Arc<dyn LedgerApi>,
    /// Used when a list request omits `page_size`
    pub default_page_size: i64,
}

impl AppState {
    pub fn new(ledger: Arc<dyn LedgerApi>, default_page_size: i64) -> Self {
        Self {
            ledger,
            default_page_size,
        }
    }
}
