//! Shared helpers for integration tests
#![allow(dead_code)]

pub mod properties;

use rand::Rng;
use rand::distributions::Alphanumeric;

use ledger_store::models::{Account, CreateAccountParams, Currency};
use ledger_store::store::{Queries, Store};

/// Random lowercase owner name, six characters
pub fn random_owner() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}

/// Random amount in `[min, max]`
pub fn random_amount(min: i64, max: i64) -> i64 {
    rand::thread_rng().gen_range(min..=max)
}

pub fn random_currency() -> Currency {
    Currency::ALL[rand::thread_rng().gen_range(0..Currency::ALL.len())]
}

/// Insert an account with a random owner straight through the repository.
pub async fn seed_account<S: Store>(store: &S, balance: i64) -> Account {
    let mut session = store.session().await.expect("session");
    session
        .create_account(CreateAccountParams {
            owner: random_owner(),
            balance,
            currency: random_currency(),
        })
        .await
        .expect("create account")
}

pub async fn balance_of<S: Store>(store: &S, id: i64) -> i64 {
    let mut session = store.session().await.expect("session");
    session.get_account(id).await.expect("get account").balance
}
