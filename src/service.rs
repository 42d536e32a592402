//! Service Facade
//!
//! The only entry point the gateway uses. Validates raw input, delegates to the
//! repository or the [`TransferEngine`], and reports failures as [`LedgerError`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Account, CreateAccountParams, Currency, Entry, ListParams, Transfer, TransferTxParams,
    TransferTxResult,
};
use crate::store::{Queries, Store, StoreError};
use crate::transfer::TransferEngine;

/// Ledger operations exposed to transports
#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn create_account(&self, owner: &str, currency: &str) -> LedgerResult<Account>;
    async fn get_account(&self, id: i64) -> LedgerResult<Account>;
    async fn list_accounts(&self, page_id: i64, page_size: i64) -> LedgerResult<Vec<Account>>;
    async fn delete_account(&self, id: i64) -> LedgerResult<()>;

    async fn transfer(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> LedgerResult<TransferTxResult>;
    async fn get_transfer(&self, id: i64) -> LedgerResult<Transfer>;
    async fn list_transfers(&self, page_id: i64, page_size: i64) -> LedgerResult<Vec<Transfer>>;

    async fn get_entry(&self, id: i64) -> LedgerResult<Entry>;
    async fn list_entries(&self, page_id: i64, page_size: i64) -> LedgerResult<Vec<Entry>>;

    /// Round-trip to the backing store.
    async fn health_check(&self) -> LedgerResult<()>;
}

/// [`LedgerApi`] over any [`Store`]
pub struct LedgerService<S: Store> {
    store: Arc<S>,
    engine: TransferEngine<S>,
    config: LedgerConfig,
}

impl<S: Store> LedgerService<S> {
    pub fn new(store: Arc<S>, config: LedgerConfig) -> Self {
        Self {
            engine: TransferEngine::new(store.clone()),
            store,
            config,
        }
    }

    /// Translate 1-based `page_id`/`page_size` into a limit/offset window.
    fn page(&self, page_id: i64, page_size: i64) -> LedgerResult<ListParams> {
        if page_id < 1 {
            return Err(LedgerError::invalid("page_id must be >= 1"));
        }
        if page_size < 1 || page_size > self.config.max_page_size {
            return Err(LedgerError::invalid(format!(
                "page_size must be between 1 and {}",
                self.config.max_page_size
            )));
        }
        let offset = (page_id - 1)
            .checked_mul(page_size)
            .ok_or_else(|| LedgerError::invalid("page_id out of range"))?;
        Ok(ListParams::new(page_size, offset)?)
    }
}

fn require_id(name: &str, id: i64) -> LedgerResult<()> {
    if id <= 0 {
        return Err(LedgerError::invalid(format!("{} must be positive", name)));
    }
    Ok(())
}

/// Log server-side failures; client errors are returned silently.
fn observe<T>(op: &'static str, result: LedgerResult<T>) -> LedgerResult<T> {
    if let Err(LedgerError::Internal(detail)) = &result {
        error!(op, error = %detail, "Ledger operation failed");
    }
    result
}

#[async_trait]
impl<S: Store> LedgerApi for LedgerService<S> {
    async fn create_account(&self, owner: &str, currency: &str) -> LedgerResult<Account> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(LedgerError::invalid("owner is required"));
        }
        let currency: Currency = currency
            .trim()
            .parse()
            .map_err(|e: crate::models::UnsupportedCurrency| LedgerError::invalid(e.to_string()))?;

        let result = async {
            let mut session = self.store.session().await?;
            let account = session
                .create_account(CreateAccountParams {
                    owner: owner.to_string(),
                    balance: 0,
                    currency,
                })
                .await?;
            Ok::<_, LedgerError>(account)
        }
        .await;

        if let Ok(account) = &result {
            info!(
                account_id = account.id,
                owner = %account.owner,
                currency = %account.currency,
                "Account created"
            );
        }
        observe("create_account", result)
    }

    async fn get_account(&self, id: i64) -> LedgerResult<Account> {
        require_id("id", id)?;
        let result = async {
            let mut session = self.store.session().await?;
            Ok::<_, LedgerError>(session.get_account(id).await?)
        }
        .await;
        observe("get_account", result)
    }

    async fn list_accounts(&self, page_id: i64, page_size: i64) -> LedgerResult<Vec<Account>> {
        let page = self.page(page_id, page_size)?;
        let result = async {
            let mut session = self.store.session().await?;
            Ok::<_, LedgerError>(session.list_accounts(page).await?)
        }
        .await;
        observe("list_accounts", result)
    }

    async fn delete_account(&self, id: i64) -> LedgerResult<()> {
        require_id("id", id)?;
        let result = async {
            let mut session = self.store.session().await?;
            session.delete_account(id).await.map_err(|e| match e {
                StoreError::ForeignKeyViolation(_) => LedgerError::invalid(format!(
                    "account {} has entries or transfers and cannot be deleted",
                    id
                )),
                other => LedgerError::from(other),
            })?;
            Ok::<_, LedgerError>(())
        }
        .await;

        if result.is_ok() {
            info!(account_id = id, "Account deleted");
        }
        observe("delete_account", result)
    }

    async fn transfer(
        &self,
        from_account_id: i64,
        to_account_id: i64,
        amount: i64,
    ) -> LedgerResult<TransferTxResult> {
        let params = TransferTxParams {
            from_account_id,
            to_account_id,
            amount,
        };
        TransferEngine::<S>::validate(&params)?;

        let deadline = Duration::from_millis(self.config.transfer_timeout_ms);
        let result = match tokio::time::timeout(deadline, self.engine.transfer(params)).await {
            Ok(result) => result,
            // The unit of work was dropped with the future and has rolled back.
            Err(_) => Err(LedgerError::internal(format!(
                "transfer timed out after {}ms",
                self.config.transfer_timeout_ms
            ))),
        };
        observe("transfer", result)
    }

    async fn get_transfer(&self, id: i64) -> LedgerResult<Transfer> {
        require_id("id", id)?;
        let result = async {
            let mut session = self.store.session().await?;
            Ok::<_, LedgerError>(session.get_transfer(id).await?)
        }
        .await;
        observe("get_transfer", result)
    }

    async fn list_transfers(&self, page_id: i64, page_size: i64) -> LedgerResult<Vec<Transfer>> {
        let page = self.page(page_id, page_size)?;
        let result = async {
            let mut session = self.store.session().await?;
            Ok::<_, LedgerError>(session.list_transfers(page).await?)
        }
        .await;
        observe("list_transfers", result)
    }

    async fn get_entry(&self, id: i64) -> LedgerResult<Entry> {
        require_id("id", id)?;
        let result = async {
            let mut session = self.store.session().await?;
            Ok::<_, LedgerError>(session.get_entry(id).await?)
        }
        .await;
        observe("get_entry", result)
    }

    async fn list_entries(&self, page_id: i64, page_size: i64) -> LedgerResult<Vec<Entry>> {
        let page = self.page(page_id, page_size)?;
        let result = async {
            let mut session = self.store.session().await?;
            Ok::<_, LedgerError>(session.list_entries(page).await?)
        }
        .await;
        observe("list_entries", result)
    }

    async fn health_check(&self) -> LedgerResult<()> {
        observe("health_check", self.store.ping().await.map_err(Into::into))
    }
}
