//! In-process store backend
//!
//! Mirrors the transactional behaviour the ledger relies on from PostgreSQL:
//!
//! - **Isolation**: a unit of work buffers its writes privately; other units only ever
//!   see committed rows (no dirty reads).
//! - **Row locks**: `update_*`, `delete_*` and `add_account_balance` take an exclusive
//!   per-row lock held until commit/rollback. Waits are bounded by `lock_timeout`,
//!   which surfaces as [`StoreError::LockTimeout`]. A row's lock entry lives only while
//!   some unit holds or waits on it.
//! - **Referential integrity**: entries and transfers must reference existing accounts,
//!   and a referenced account cannot be deleted. Checked per statement and again at
//!   commit.
//! - **Sequences**: ids come from monotonically increasing counters that are not rolled
//!   back, like `BIGSERIAL`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::error::{StoreError, StoreResult};
use super::{Queries, Store, UnitOfWork};
use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Entry, ListParams, Transfer, UpdateAccountParams, UpdateEntryParams,
    UpdateTransferParams,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const ENTRIES_ACCOUNT_FK: &str = "entries_account_id_fkey";
const TRANSFERS_FROM_FK: &str = "transfers_from_account_id_fkey";
const TRANSFERS_TO_FK: &str = "transfers_to_account_id_fkey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RowKey {
    Account(i64),
    Entry(i64),
    Transfer(i64),
}

/// Committed state
#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<i64, Account>,
    entries: BTreeMap<i64, Entry>,
    transfers: BTreeMap<i64, Transfer>,
}

/// Uncommitted writes of one unit of work. `None` marks a deleted row.
#[derive(Debug, Default)]
struct Changes {
    accounts: BTreeMap<i64, Option<Account>>,
    entries: BTreeMap<i64, Option<Entry>>,
    transfers: BTreeMap<i64, Option<Transfer>>,
}

impl Changes {
    fn apply(self, tables: &mut Tables) {
        apply_rows(&mut tables.accounts, self.accounts);
        apply_rows(&mut tables.entries, self.entries);
        apply_rows(&mut tables.transfers, self.transfers);
    }
}

fn apply_rows<T>(table: &mut BTreeMap<i64, T>, changes: BTreeMap<i64, Option<T>>) {
    for (id, row) in changes {
        match row {
            Some(row) => {
                table.insert(id, row);
            }
            None => {
                table.remove(&id);
            }
        }
    }
}

fn lookup<'a, T>(
    committed: &'a BTreeMap<i64, T>,
    pending: &'a BTreeMap<i64, Option<T>>,
    id: i64,
) -> Option<&'a T> {
    match pending.get(&id) {
        Some(row) => row.as_ref(),
        None => committed.get(&id),
    }
}

fn merged<'a, T>(
    committed: &'a BTreeMap<i64, T>,
    pending: &'a BTreeMap<i64, Option<T>>,
) -> BTreeMap<i64, &'a T> {
    let mut rows: BTreeMap<i64, &T> = committed.iter().map(|(id, row)| (*id, row)).collect();
    for (id, row) in pending {
        match row {
            Some(row) => {
                rows.insert(*id, row);
            }
            None => {
                rows.remove(id);
            }
        }
    }
    rows
}

fn page<T: Clone>(rows: BTreeMap<i64, &T>, page: ListParams) -> Vec<T> {
    rows.into_values()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

/// Committed tables seen through one unit of work's pending changes
struct View<'a> {
    tables: &'a Tables,
    changes: &'a Changes,
}

impl View<'_> {
    fn account(&self, id: i64) -> Option<&Account> {
        lookup(&self.tables.accounts, &self.changes.accounts, id)
    }

    fn entry(&self, id: i64) -> Option<&Entry> {
        lookup(&self.tables.entries, &self.changes.entries, id)
    }

    fn transfer(&self, id: i64) -> Option<&Transfer> {
        lookup(&self.tables.transfers, &self.changes.transfers, id)
    }

    fn is_referenced(&self, account_id: i64) -> bool {
        merged(&self.tables.entries, &self.changes.entries)
            .values()
            .any(|e| e.account_id == account_id)
            || merged(&self.tables.transfers, &self.changes.transfers)
                .values()
                .any(|t| t.from_account_id == account_id || t.to_account_id == account_id)
    }

    fn check_transfer_refs(&self, from: i64, to: i64) -> StoreResult<()> {
        if self.account(from).is_none() {
            return Err(StoreError::ForeignKeyViolation(TRANSFERS_FROM_FK.to_string()));
        }
        if self.account(to).is_none() {
            return Err(StoreError::ForeignKeyViolation(TRANSFERS_TO_FK.to_string()));
        }
        Ok(())
    }

    /// Re-validate every pending write against the latest committed state.
    fn check_integrity(&self) -> StoreResult<()> {
        for entry in self.changes.entries.values().flatten() {
            if self.account(entry.account_id).is_none() {
                return Err(StoreError::ForeignKeyViolation(ENTRIES_ACCOUNT_FK.to_string()));
            }
        }
        for transfer in self.changes.transfers.values().flatten() {
            self.check_transfer_refs(transfer.from_account_id, transfer.to_account_id)?;
        }
        for (id, row) in &self.changes.accounts {
            if row.is_none() && self.is_referenced(*id) {
                return Err(StoreError::ForeignKeyViolation(ENTRIES_ACCOUNT_FK.to_string()));
            }
        }
        Ok(())
    }
}

struct Inner {
    tables: Mutex<Tables>,
    row_locks: DashMap<RowKey, Arc<RowLock<()>>>,
    lock_timeout: Duration,
    account_seq: AtomicI64,
    entry_seq: AtomicI64,
    transfer_seq: AtomicI64,
    units_begun: AtomicU64,
}

impl Inner {
    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn row_lock(&self, key: RowKey) -> Arc<RowLock<()>> {
        self.row_locks
            .entry(key)
            .or_insert_with(|| Arc::new(RowLock::new(())))
            .clone()
    }

    /// Drop the table entry once nobody holds or waits on the lock.
    fn prune_row_lock(&self, key: &RowKey) {
        self.row_locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Row locks held by one unit of work, released together.
struct HeldLocks {
    inner: Arc<Inner>,
    guards: HashMap<RowKey, OwnedMutexGuard<()>>,
}

impl Drop for HeldLocks {
    fn drop(&mut self) {
        for (key, guard) in self.guards.drain() {
            drop(guard);
            self.inner.prune_row_lock(&key);
        }
    }
}

/// In-process transactional ledger store
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Bound every row-lock wait by `lock_timeout`.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: Mutex::new(Tables::default()),
                row_locks: DashMap::new(),
                lock_timeout,
                account_seq: AtomicI64::new(1),
                entry_seq: AtomicI64::new(1),
                transfer_seq: AtomicI64::new(1),
                units_begun: AtomicU64::new(0),
            }),
        }
    }

    /// Number of explicit units of work opened so far (sessions excluded).
    pub fn units_begun(&self) -> u64 {
        self.inner.units_begun.load(Ordering::Relaxed)
    }

    fn unit(&self) -> MemoryUnitOfWork {
        MemoryUnitOfWork {
            inner: self.inner.clone(),
            changes: Changes::default(),
            locks: HeldLocks {
                inner: self.inner.clone(),
                guards: HashMap::new(),
            },
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Session = MemorySession;
    type Tx = MemoryUnitOfWork;

    async fn session(&self) -> StoreResult<MemorySession> {
        Ok(MemorySession {
            store: self.clone(),
        })
    }

    async fn begin(&self) -> StoreResult<MemoryUnitOfWork> {
        self.inner.units_begun.fetch_add(1, Ordering::Relaxed);
        Ok(self.unit())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.tables().map(|_| ())
    }
}

// ============================================================================
// Unit of work
// ============================================================================

/// One open transaction against a [`MemoryStore`]
pub struct MemoryUnitOfWork {
    inner: Arc<Inner>,
    changes: Changes,
    locks: HeldLocks,
}

impl MemoryUnitOfWork {
    async fn lock_row(&mut self, key: RowKey) -> StoreResult<()> {
        if self.locks.guards.contains_key(&key) {
            return Ok(());
        }

        let lock = self.inner.row_lock(key);
        let guard = tokio::time::timeout(self.inner.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout)?;
        self.locks.guards.insert(key, guard);
        Ok(())
    }

    /// Run `f` against the committed tables overlaid with this unit's changes.
    fn read<T>(&self, f: impl FnOnce(&View<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let tables = self.inner.tables()?;
        let view = View {
            tables: &tables,
            changes: &self.changes,
        };
        f(&view)
    }

    fn next_id(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Queries for MemoryUnitOfWork {
    async fn create_account(&mut self, params: CreateAccountParams) -> StoreResult<Account> {
        let account = Account {
            id: Self::next_id(&self.inner.account_seq),
            owner: params.owner,
            balance: params.balance,
            currency: params.currency,
            created_at: Utc::now(),
        };
        self.changes
            .accounts
            .insert(account.id, Some(account.clone()));
        Ok(account)
    }

    async fn get_account(&mut self, id: i64) -> StoreResult<Account> {
        self.read(|view| view.account(id).cloned().ok_or(StoreError::NotFound))
    }

    async fn list_accounts(&mut self, params: ListParams) -> StoreResult<Vec<Account>> {
        self.read(|view| {
            Ok(page(
                merged(&view.tables.accounts, &view.changes.accounts),
                params,
            ))
        })
    }

    async fn update_account(&mut self, params: UpdateAccountParams) -> StoreResult<Account> {
        self.lock_row(RowKey::Account(params.id)).await?;
        let mut account = self.get_account(params.id).await?;
        account.balance = params.balance;
        self.changes
            .accounts
            .insert(account.id, Some(account.clone()));
        Ok(account)
    }

    async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> StoreResult<Account> {
        // Reading only after the lock is held: the previous holder has already committed.
        self.lock_row(RowKey::Account(params.id)).await?;
        let mut account = self.get_account(params.id).await?;
        account.balance = account
            .balance
            .checked_add(params.amount)
            .ok_or_else(|| StoreError::OutOfRange(format!("balance of account {}", params.id)))?;
        self.changes
            .accounts
            .insert(account.id, Some(account.clone()));
        Ok(account)
    }

    async fn delete_account(&mut self, id: i64) -> StoreResult<()> {
        self.lock_row(RowKey::Account(id)).await?;
        self.read(|view| {
            if view.account(id).is_none() {
                return Err(StoreError::NotFound);
            }
            if view.is_referenced(id) {
                return Err(StoreError::ForeignKeyViolation(ENTRIES_ACCOUNT_FK.to_string()));
            }
            Ok(())
        })?;
        self.changes.accounts.insert(id, None);
        Ok(())
    }

    async fn create_entry(&mut self, params: CreateEntryParams) -> StoreResult<Entry> {
        self.read(|view| match view.account(params.account_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::ForeignKeyViolation(ENTRIES_ACCOUNT_FK.to_string())),
        })?;
        let entry = Entry {
            id: Self::next_id(&self.inner.entry_seq),
            account_id: params.account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.changes.entries.insert(entry.id, Some(entry.clone()));
        Ok(entry)
    }

    async fn get_entry(&mut self, id: i64) -> StoreResult<Entry> {
        self.read(|view| view.entry(id).cloned().ok_or(StoreError::NotFound))
    }

    async fn list_entries(&mut self, params: ListParams) -> StoreResult<Vec<Entry>> {
        self.read(|view| {
            Ok(page(
                merged(&view.tables.entries, &view.changes.entries),
                params,
            ))
        })
    }

    async fn update_entry(&mut self, params: UpdateEntryParams) -> StoreResult<Entry> {
        self.lock_row(RowKey::Entry(params.id)).await?;
        let mut entry = self.get_entry(params.id).await?;
        entry.amount = params.amount;
        self.changes.entries.insert(entry.id, Some(entry.clone()));
        Ok(entry)
    }

    async fn delete_entry(&mut self, id: i64) -> StoreResult<()> {
        self.lock_row(RowKey::Entry(id)).await?;
        self.get_entry(id).await?;
        self.changes.entries.insert(id, None);
        Ok(())
    }

    async fn create_transfer(&mut self, params: CreateTransferParams) -> StoreResult<Transfer> {
        self.read(|view| view.check_transfer_refs(params.from_account_id, params.to_account_id))?;
        let transfer = Transfer {
            id: Self::next_id(&self.inner.transfer_seq),
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
            created_at: Utc::now(),
        };
        self.changes
            .transfers
            .insert(transfer.id, Some(transfer.clone()));
        Ok(transfer)
    }

    async fn get_transfer(&mut self, id: i64) -> StoreResult<Transfer> {
        self.read(|view| view.transfer(id).cloned().ok_or(StoreError::NotFound))
    }

    async fn list_transfers(&mut self, params: ListParams) -> StoreResult<Vec<Transfer>> {
        self.read(|view| {
            Ok(page(
                merged(&view.tables.transfers, &view.changes.transfers),
                params,
            ))
        })
    }

    async fn update_transfer(&mut self, params: UpdateTransferParams) -> StoreResult<Transfer> {
        self.lock_row(RowKey::Transfer(params.id)).await?;
        let mut transfer = self.get_transfer(params.id).await?;
        transfer.amount = params.amount;
        self.changes
            .transfers
            .insert(transfer.id, Some(transfer.clone()));
        Ok(transfer)
    }

    async fn delete_transfer(&mut self, id: i64) -> StoreResult<()> {
        self.lock_row(RowKey::Transfer(id)).await?;
        self.get_transfer(id).await?;
        self.changes.transfers.insert(id, None);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> StoreResult<()> {
        let MemoryUnitOfWork {
            inner,
            changes,
            locks,
        } = self;

        {
            let mut tables = inner.tables()?;
            View {
                tables: &tables,
                changes: &changes,
            }
            .check_integrity()?;
            changes.apply(&mut tables);
        }

        // Row locks are released only once the new values are visible.
        drop(locks);
        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        Ok(())
    }
}

// ============================================================================
// Autocommit session
// ============================================================================

/// Autocommit handle: every call runs in its own unit of work.
pub struct MemorySession {
    store: MemoryStore,
}

impl MemorySession {
    async fn autocommit<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut MemoryUnitOfWork) -> BoxFuture<'t, StoreResult<T>> + Send,
    {
        let mut tx = self.store.unit();
        let value = f(&mut tx).await?;
        tx.commit().await?;
        Ok(value)
    }
}

#[async_trait]
impl Queries for MemorySession {
    async fn create_account(&mut self, params: CreateAccountParams) -> StoreResult<Account> {
        self.autocommit(move |tx| tx.create_account(params)).await
    }

    async fn get_account(&mut self, id: i64) -> StoreResult<Account> {
        self.autocommit(move |tx| tx.get_account(id)).await
    }

    async fn list_accounts(&mut self, params: ListParams) -> StoreResult<Vec<Account>> {
        self.autocommit(move |tx| tx.list_accounts(params)).await
    }

    async fn update_account(&mut self, params: UpdateAccountParams) -> StoreResult<Account> {
        self.autocommit(move |tx| tx.update_account(params)).await
    }

    async fn add_account_balance(
        &mut self,
        params: AddAccountBalanceParams,
    ) -> StoreResult<Account> {
        self.autocommit(move |tx| tx.add_account_balance(params)).await
    }

    async fn delete_account(&mut self, id: i64) -> StoreResult<()> {
        self.autocommit(move |tx| tx.delete_account(id)).await
    }

    async fn create_entry(&mut self, params: CreateEntryParams) -> StoreResult<Entry> {
        self.autocommit(move |tx| tx.create_entry(params)).await
    }

    async fn get_entry(&mut self, id: i64) -> StoreResult<Entry> {
        self.autocommit(move |tx| tx.get_entry(id)).await
    }

    async fn list_entries(&mut self, params: ListParams) -> StoreResult<Vec<Entry>> {
        self.autocommit(move |tx| tx.list_entries(params)).await
    }

    async fn update_entry(&mut self, params: UpdateEntryParams) -> StoreResult<Entry> {
        self.autocommit(move |tx| tx.update_entry(params)).await
    }

    async fn delete_entry(&mut self, id: i64) -> StoreResult<()> {
        self.autocommit(move |tx| tx.delete_entry(id)).await
    }

    async fn create_transfer(&mut self, params: CreateTransferParams) -> StoreResult<Transfer> {
        self.autocommit(move |tx| tx.create_transfer(params)).await
    }

    async fn get_transfer(&mut self, id: i64) -> StoreResult<Transfer> {
        self.autocommit(move |tx| tx.get_transfer(id)).await
    }

    async fn list_transfers(&mut self, params: ListParams) -> StoreResult<Vec<Transfer>> {
        self.autocommit(move |tx| tx.list_transfers(params)).await
    }

    async fn update_transfer(&mut self, params: UpdateTransferParams) -> StoreResult<Transfer> {
        self.autocommit(move |tx| tx.update_transfer(params)).await
    }

    async fn delete_transfer(&mut self, id: i64) -> StoreResult<()> {
        self.autocommit(move |tx| tx.delete_transfer(id)).await
    }
}
