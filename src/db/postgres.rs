//! [`Store`] implementation over a PostgreSQL pool

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres, Transaction};

use super::queries;
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListParams, Transfer, UpdateAccountParams, UpdateEntryParams,
    UpdateTransferParams,
};
use crate::store::{Queries, Store, StoreResult, UnitOfWork};

/// PostgreSQL-backed ledger store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    type Session = PgSession;
    type Tx = PgUnitOfWork;

    async fn session(&self) -> StoreResult<PgSession> {
        Ok(PgSession {
            conn: self.pool.acquire().await?,
        })
    }

    async fn begin(&self) -> StoreResult<PgUnitOfWork> {
        Ok(PgUnitOfWork {
            tx: self.pool.begin().await?,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Pooled connection in autocommit mode
pub struct PgSession {
    conn: PoolConnection<Postgres>,
}

/// Open `BEGIN … COMMIT` block; sqlx rolls it back when dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Both handles deref to a `PgConnection`; route every statement through [`queries`].
macro_rules! impl_pg_queries {
    ($handle:ty, $field:ident) => {
        #[async_trait]
        impl Queries for $handle {
            async fn create_account(&mut self, params: CreateAccountParams) -> StoreResult<Account> {
                queries::create_account(&mut *self.$field, &params).await
            }

            async fn get_account(&mut self, id: i64) -> StoreResult<Account> {
                queries::get_account(&mut *self.$field, id).await
            }

            async fn list_accounts(&mut self, page: ListParams) -> StoreResult<Vec<Account>> {
                queries::list_accounts(&mut *self.$field, page).await
            }

            async fn update_account(&mut self, params: UpdateAccountParams) -> StoreResult<Account> {
                queries::update_account(&mut *self.$field, params).await
            }

            async fn add_account_balance(
                &mut self,
                params: AddAccountBalanceParams,
            ) -> StoreResult<Account> {
                queries::add_account_balance(&mut *self.$field, params).await
            }

            async fn delete_account(&mut self, id: i64) -> StoreResult<()> {
                queries::delete_account(&mut *self.$field, id).await
            }

            async fn create_entry(&mut self, params: CreateEntryParams) -> StoreResult<Entry> {
                queries::create_entry(&mut *self.$field, params).await
            }

            async fn get_entry(&mut self, id: i64) -> StoreResult<Entry> {
                queries::get_entry(&mut *self.$field, id).await
            }

            async fn list_entries(&mut self, page: ListParams) -> StoreResult<Vec<Entry>> {
                queries::list_entries(&mut *self.$field, page).await
            }

            async fn update_entry(&mut self, params: UpdateEntryParams) -> StoreResult<Entry> {
                queries::update_entry(&mut *self.$field, params).await
            }

            async fn delete_entry(&mut self, id: i64) -> StoreResult<()> {
                queries::delete_entry(&mut *self.$field, id).await
            }

            async fn create_transfer(
                &mut self,
                params: CreateTransferParams,
            ) -> StoreResult<Transfer> {
                queries::create_transfer(&mut *self.$field, params).await
            }

            async fn get_transfer(&mut self, id: i64) -> StoreResult<Transfer> {
                queries::get_transfer(&mut *self.$field, id).await
            }

            async fn list_transfers(&mut self, page: ListParams) -> StoreResult<Vec<Transfer>> {
                queries::list_transfers(&mut *self.$field, page).await
            }

            async fn update_transfer(
                &mut self,
                params: UpdateTransferParams,
            ) -> StoreResult<Transfer> {
                queries::update_transfer(&mut *self.$field, params).await
            }

            async fn delete_transfer(&mut self, id: i64) -> StoreResult<()> {
                queries::delete_transfer(&mut *self.$field, id).await
            }
        }
    };
}

impl_pg_queries!(PgSession, conn);
impl_pg_queries!(PgUnitOfWork, tx);
