//! Ledger properties, checked against any `Store` backend

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use ledger_store::LedgerError;
use ledger_store::models::{
    CreateEntryParams, CreateTransferParams, ListParams, TransferTxParams, UpdateAccountParams,
    UpdateEntryParams, UpdateTransferParams,
};
use ledger_store::store::{Queries, Store, StoreError};
use ledger_store::transfer::TransferEngine;

use super::{balance_of, random_amount, seed_account};

fn transfer(from: i64, to: i64, amount: i64) -> TransferTxParams {
    TransferTxParams {
        from_account_id: from,
        to_account_id: to,
        amount,
    }
}

/// A failure in the last step leaves every earlier write of the transfer undone.
pub async fn transfer_is_atomic<S: Store>(store: Arc<S>) {
    let engine = TransferEngine::new(store.clone());
    let low = seed_account(store.as_ref(), 100).await;
    // Crediting this account overflows i64, and it is updated last.
    let high = seed_account(store.as_ref(), i64::MAX - 5).await;
    assert!(low.id < high.id);

    let err = engine
        .transfer(transfer(low.id, high.id, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Internal(_)), "got {:?}", err);

    assert_eq!(balance_of(store.as_ref(), low.id).await, 100);
    assert_eq!(balance_of(store.as_ref(), high.id).await, i64::MAX - 5);

    // Missing destination fails at the first insert
    let err = engine
        .transfer(transfer(low.id, i64::MAX, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)), "got {:?}", err);
    assert_eq!(balance_of(store.as_ref(), low.id).await, 100);
}

/// Successful transfers never create or destroy money.
pub async fn balances_are_conserved<S: Store>(store: Arc<S>) {
    let engine = TransferEngine::new(store.clone());
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(seed_account(store.as_ref(), 1_000).await.id);
    }

    let mut handles = Vec::new();
    for i in 0..30 {
        let engine = engine.clone();
        let from = ids[i % 3];
        let to = ids[(i + 1 + i / 3) % 3];
        if from == to {
            continue;
        }
        let amount = random_amount(1, 50);
        handles.push(tokio::spawn(async move {
            engine.transfer(transfer(from, to, amount)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let mut total = 0;
    for id in &ids {
        total += balance_of(store.as_ref(), *id).await;
    }
    assert_eq!(total, 3_000);
}

/// A=100, B=100, ten concurrent A→B transfers of K: every one succeeds and none is lost.
pub async fn concurrent_transfers_lose_no_update<S: Store>(store: Arc<S>) {
    const N: i64 = 10;
    const K: i64 = 10;

    let engine = TransferEngine::new(store.clone());
    let a = seed_account(store.as_ref(), 100).await;
    let b = seed_account(store.as_ref(), 100).await;

    let (a_id, b_id) = (a.id, b.id);
    let handles: Vec<_> = (0..N)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.transfer(transfer(a_id, b_id, K)).await })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.transfer.amount, K);
        assert_eq!(result.from_entry.amount, -K);
        assert_eq!(result.to_entry.amount, K);

        // Each transfer observed a distinct post-update balance: k*K moved so far
        let moved = 100 - result.from_account.balance;
        assert_eq!(moved, result.to_account.balance - 100);
        assert_eq!(moved % K, 0);
        let k = moved / K;
        assert!((1..=N).contains(&k));
        assert!(seen.insert(k), "two transfers saw the same balance");
    }

    assert_eq!(balance_of(store.as_ref(), a.id).await, 100 - N * K);
    assert_eq!(balance_of(store.as_ref(), b.id).await, 100 + N * K);
}

/// Ten concurrent transfers alternating direction all commit; the net effect is zero.
pub async fn opposite_transfers_do_not_deadlock<S: Store>(store: Arc<S>) {
    let engine = TransferEngine::new(store.clone());
    let a = seed_account(store.as_ref(), 100).await;
    let b = seed_account(store.as_ref(), 100).await;

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let engine = engine.clone();
            let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            tokio::spawn(async move { engine.transfer(transfer(from, to, 10)).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(balance_of(store.as_ref(), a.id).await, 100);
    assert_eq!(balance_of(store.as_ref(), b.id).await, 100);
}

/// Two adjacent pages are full, disjoint and ordered by id.
pub async fn pages_are_disjoint_and_ordered<S: Store>(store: Arc<S>) {
    for _ in 0..10 {
        seed_account(store.as_ref(), random_amount(0, 1_000)).await;
    }

    let mut session = store.session().await.unwrap();
    let first = session
        .list_accounts(ListParams::new(5, 0).unwrap())
        .await
        .unwrap();
    let second = session
        .list_accounts(ListParams::new(5, 5).unwrap())
        .await
        .unwrap();

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert!(first.windows(2).all(|w| w[0].id < w[1].id));
    assert!(second.windows(2).all(|w| w[0].id < w[1].id));
    assert!(first[4].id < second[0].id);

    let ids: BTreeSet<i64> = first.iter().chain(second.iter()).map(|a| a.id).collect();
    assert_eq!(ids.len(), 10);
}

/// Reads have no side effects.
pub async fn reads_are_idempotent<S: Store>(store: Arc<S>) {
    let account = seed_account(store.as_ref(), random_amount(1, 1_000)).await;

    let mut session = store.session().await.unwrap();
    let first = session.get_account(account.id).await.unwrap();
    let second = session.get_account(account.id).await.unwrap();
    assert_eq!(first, account);
    assert_eq!(first, second);
}

/// Updates are visible to later reads; deleted records are gone.
pub async fn updates_and_deletes_are_visible<S: Store>(store: Arc<S>) {
    let a = seed_account(store.as_ref(), 100).await;
    let b = seed_account(store.as_ref(), 100).await;
    let mut session = store.session().await.unwrap();

    // Accounts
    let updated = session
        .update_account(UpdateAccountParams {
            id: a.id,
            balance: 250,
        })
        .await
        .unwrap();
    assert_eq!(updated.balance, 250);
    assert_eq!(updated.owner, a.owner);
    assert_eq!(updated.created_at, a.created_at);

    // Entries
    let entry = session
        .create_entry(CreateEntryParams {
            account_id: a.id,
            amount: random_amount(1, 100),
        })
        .await
        .unwrap();
    let entry = session
        .update_entry(UpdateEntryParams {
            id: entry.id,
            amount: 7,
        })
        .await
        .unwrap();
    assert_eq!(session.get_entry(entry.id).await.unwrap().amount, 7);
    session.delete_entry(entry.id).await.unwrap();
    assert!(matches!(
        session.get_entry(entry.id).await,
        Err(StoreError::NotFound)
    ));

    // Transfers
    let t = session
        .create_transfer(CreateTransferParams {
            from_account_id: a.id,
            to_account_id: b.id,
            amount: 5,
        })
        .await
        .unwrap();
    let t = session
        .update_transfer(UpdateTransferParams { id: t.id, amount: 9 })
        .await
        .unwrap();
    assert_eq!(session.get_transfer(t.id).await.unwrap().amount, 9);
    session.delete_transfer(t.id).await.unwrap();
    assert!(matches!(
        session.get_transfer(t.id).await,
        Err(StoreError::NotFound)
    ));

    // Both accounts are unreferenced again
    session.delete_account(b.id).await.unwrap();
    assert!(matches!(
        session.get_account(b.id).await,
        Err(StoreError::NotFound)
    ));
    assert!(matches!(
        session.delete_account(b.id).await,
        Err(StoreError::NotFound)
    ));
}

/// Accounts with history cannot be removed.
pub async fn referenced_account_is_not_deleted<S: Store>(store: Arc<S>) {
    let engine = TransferEngine::new(store.clone());
    let a = seed_account(store.as_ref(), 100).await;
    let b = seed_account(store.as_ref(), 100).await;
    engine.transfer(transfer(a.id, b.id, 1)).await.unwrap();

    let mut session = store.session().await.unwrap();
    assert!(matches!(
        session.delete_account(a.id).await,
        Err(StoreError::ForeignKeyViolation(_))
    ));
    assert_eq!(session.get_account(a.id).await.unwrap().balance, 99);
}
