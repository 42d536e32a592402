//! Transfer Engine
//!
//! Runs the whole transfer protocol inside one unit of work.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::models::{
    Account, AddAccountBalanceParams, CreateEntryParams, CreateTransferParams, TransferTxParams,
    TransferTxResult,
};
use crate::store::{Queries, Store, StoreResult, exec_tx};

/// Executes atomic transfers against any [`Store`]
pub struct TransferEngine<S: Store> {
    store: Arc<S>,
}

impl<S: Store> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> TransferEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check a transfer request without touching the store.
    pub fn validate(params: &TransferTxParams) -> Result<(), LedgerError> {
        if params.amount <= 0 {
            return Err(LedgerError::invalid(format!(
                "amount must be positive, got {}",
                params.amount
            )));
        }
        if params.from_account_id <= 0 || params.to_account_id <= 0 {
            return Err(LedgerError::invalid("account ids must be positive"));
        }
        if params.from_account_id == params.to_account_id {
            return Err(LedgerError::invalid(
                "cannot transfer between the same account",
            ));
        }
        Ok(())
    }

    /// Move `amount` from one account to the other.
    ///
    /// Creates the transfer record, both entries and both balance deltas in a single unit
    /// of work. Either all five writes commit or none do.
    pub async fn transfer(
        &self,
        params: TransferTxParams,
    ) -> Result<TransferTxResult, LedgerError> {
        Self::validate(&params)?;

        let result = exec_tx(self.store.as_ref(), move |tx| {
            Box::pin(run_transfer(tx, params))
        })
        .await;

        match &result {
            Ok(done) => info!(
                transfer_id = done.transfer.id,
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                "Transfer committed"
            ),
            Err(e) => warn!(
                from_account_id = params.from_account_id,
                to_account_id = params.to_account_id,
                amount = params.amount,
                error = %e,
                "Transfer rolled back"
            ),
        }

        result
    }
}

async fn run_transfer<Q>(q: &mut Q, params: TransferTxParams) -> Result<TransferTxResult, LedgerError>
where
    Q: Queries + ?Sized,
{
    let transfer = q
        .create_transfer(CreateTransferParams {
            from_account_id: params.from_account_id,
            to_account_id: params.to_account_id,
            amount: params.amount,
        })
        .await?;

    let from_entry = q
        .create_entry(CreateEntryParams {
            account_id: params.from_account_id,
            amount: -params.amount,
        })
        .await?;

    let to_entry = q
        .create_entry(CreateEntryParams {
            account_id: params.to_account_id,
            amount: params.amount,
        })
        .await?;

    let (from_account, to_account) = apply_balances(q, &params).await?;

    debug!(
        transfer_id = transfer.id,
        from_balance = from_account.balance,
        to_balance = to_account.balance,
        "Balances applied"
    );

    Ok(TransferTxResult {
        transfer,
        from_entry,
        to_entry,
        from_account,
        to_account,
    })
}

/// Apply both deltas, always touching the lower account id first.
///
/// Every transfer acquires the two row locks in the same global order, so two transfers
/// over the same pair can never wait on each other in a cycle.
async fn apply_balances<Q>(q: &mut Q, params: &TransferTxParams) -> StoreResult<(Account, Account)>
where
    Q: Queries + ?Sized,
{
    let debit = AddAccountBalanceParams {
        id: params.from_account_id,
        amount: -params.amount,
    };
    let credit = AddAccountBalanceParams {
        id: params.to_account_id,
        amount: params.amount,
    };

    let (first, _) = params.lock_order();
    if first == params.from_account_id {
        let from_account = q.add_account_balance(debit).await?;
        let to_account = q.add_account_balance(credit).await?;
        Ok((from_account, to_account))
    } else {
        let to_account = q.add_account_balance(credit).await?;
        let from_account = q.add_account_balance(debit).await?;
        Ok((from_account, to_account))
    }
}
