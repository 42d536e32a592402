//! Ledger repository abstraction
//!
//! # Layers
//!
//! - [`Queries`]: per-statement CRUD over accounts, entries and transfers, plus the
//!   atomic `add_account_balance` read-modify-write primitive.
//! - [`UnitOfWork`]: a [`Queries`] handle whose statements commit or roll back together.
//! - [`Store`]: hands out autocommit sessions and units of work.
//! - [`exec_tx`]: runs a closure inside one unit of work, committing on `Ok` and rolling
//!   back on `Err`.
//!
//! Two backends implement [`Store`]: [`crate::db::PgStore`] (PostgreSQL) and
//! [`MemoryStore`] (in-process, used by tests and local runs).

pub mod error;
pub mod memory;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListParams, Transfer, UpdateAccountParams, UpdateEntryParams,
    UpdateTransferParams,
};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Per-statement access to the three ledger tables.
///
/// Every method is a single statement. Called on a [`UnitOfWork`] it joins that unit;
/// called on a session it commits immediately.
#[async_trait]
pub trait Queries: Send {
    // === Accounts ===
    async fn create_account(&mut self, params: CreateAccountParams) -> StoreResult<Account>;
    async fn get_account(&mut self, id: i64) -> StoreResult<Account>;
    async fn list_accounts(&mut self, page: ListParams) -> StoreResult<Vec<Account>>;
    async fn update_account(&mut self, params: UpdateAccountParams) -> StoreResult<Account>;
    /// Atomically apply `balance := balance + amount` and return the updated row.
    ///
    /// Holds the account's row lock until the enclosing unit of work ends.
    async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> StoreResult<Account>;
    async fn delete_account(&mut self, id: i64) -> StoreResult<()>;

    // === Entries ===
    async fn create_entry(&mut self, params: CreateEntryParams) -> StoreResult<Entry>;
    async fn get_entry(&mut self, id: i64) -> StoreResult<Entry>;
    async fn list_entries(&mut self, page: ListParams) -> StoreResult<Vec<Entry>>;
    async fn update_entry(&mut self, params: UpdateEntryParams) -> StoreResult<Entry>;
    async fn delete_entry(&mut self, id: i64) -> StoreResult<()>;

    // === Transfers ===
    async fn create_transfer(&mut self, params: CreateTransferParams) -> StoreResult<Transfer>;
    async fn get_transfer(&mut self, id: i64) -> StoreResult<Transfer>;
    async fn list_transfers(&mut self, page: ListParams) -> StoreResult<Vec<Transfer>>;
    async fn update_transfer(&mut self, params: UpdateTransferParams) -> StoreResult<Transfer>;
    async fn delete_transfer(&mut self, id: i64) -> StoreResult<()>;
}

/// A transaction scope. Dropping it without calling [`UnitOfWork::commit`] rolls it back.
#[async_trait]
pub trait UnitOfWork: Queries {
    async fn commit(self) -> StoreResult<()>;
    async fn rollback(self) -> StoreResult<()>;
}

/// Transactional storage backend
#[async_trait]
pub trait Store: Send + Sync + 'static {
    type Session: Queries;
    type Tx: UnitOfWork;

    /// Borrow an autocommit session: each call is its own single-statement unit of work.
    async fn session(&self) -> StoreResult<Self::Session>;

    /// Open a new unit of work.
    async fn begin(&self) -> StoreResult<Self::Tx>;

    /// Cheap liveness probe.
    async fn ping(&self) -> StoreResult<()>;
}

/// Run `f` inside one unit of work.
///
/// Commits when `f` returns `Ok`. On `Err` the unit is rolled back and the original
/// error is returned; a failing rollback is logged, never substituted for it.
pub async fn exec_tx<S, T, E, F>(store: &S, f: F) -> Result<T, E>
where
    S: Store + ?Sized,
    T: Send,
    E: From<StoreError> + std::fmt::Display + Send,
    F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T, E>> + Send,
{
    let mut tx = store.begin().await?;

    match f(&mut tx).await {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    error = %err,
                    rollback_error = %rollback_err,
                    "Rollback failed"
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;

    fn params(owner: &str) -> CreateAccountParams {
        CreateAccountParams {
            owner: owner.to_string(),
            balance: 100,
            currency: Currency::Usd,
        }
    }

    #[tokio::test]
    async fn test_exec_tx_commits_on_ok() {
        let store = MemoryStore::new();

        let result: Result<Account, StoreError> = exec_tx(&store, |tx| {
            Box::pin(async move {
                let account = tx.create_account(params("alice")).await?;
                tx.add_account_balance(AddAccountBalanceParams {
                    id: account.id,
                    amount: 50,
                })
                .await
            })
        })
        .await;
        let account = result.unwrap();

        let mut session = store.session().await.unwrap();
        let stored = session.get_account(account.id).await.unwrap();
        assert_eq!(stored.balance, 150);
    }

    #[tokio::test]
    async fn test_exec_tx_rolls_back_on_err() {
        let store = MemoryStore::new();

        let result: Result<(), StoreError> = exec_tx(&store, |tx| {
            Box::pin(async move {
                tx.create_account(params("bob")).await?;
                // Entry against a missing account fails after the insert above
                tx.create_entry(CreateEntryParams {
                    account_id: 9999,
                    amount: 10,
                })
                .await?;
                Ok(())
            })
        })
        .await;

        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));

        let mut session = store.session().await.unwrap();
        let accounts = session
            .list_accounts(ListParams::new(10, 0).unwrap())
            .await
            .unwrap();
        assert!(accounts.is_empty(), "rolled back insert must not be visible");
    }
}
