//! Ledger SQL statements
//!
//! One function per statement. Each takes a `&mut PgConnection`, so the same code runs
//! on an autocommit pooled connection or inside an open transaction.

use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};

use crate::models::{
    Account, AddAccountBalanceParams, CreateAccountParams, CreateEntryParams,
    CreateTransferParams, Currency, Entry, ListParams, Transfer, UpdateAccountParams,
    UpdateEntryParams, UpdateTransferParams,
};
use crate::store::{StoreError, StoreResult};

// ============================================================================
// Row mapping
// ============================================================================

fn account_from_row(row: &PgRow) -> StoreResult<Account> {
    let currency: String = row.try_get("currency")?;
    let currency: Currency = currency
        .parse()
        .map_err(|e: crate::models::UnsupportedCurrency| StoreError::Decode(e.to_string()))?;

    Ok(Account {
        id: row.try_get("id")?,
        owner: row.try_get("owner")?,
        balance: row.try_get("balance")?,
        currency,
        created_at: row.try_get("created_at")?,
    })
}

fn entry_from_row(row: &PgRow) -> StoreResult<Entry> {
    Ok(Entry {
        id: row.try_get("id")?,
        account_id: row.try_get("account_id")?,
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn transfer_from_row(row: &PgRow) -> StoreResult<Transfer> {
    Ok(Transfer {
        id: row.try_get("id")?,
        from_account_id: row.try_get("from_account_id")?,
        to_account_id: row.try_get("to_account_id")?,
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
    })
}

fn expect_affected(rows_affected: u64) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn create_account(
    conn: &mut PgConnection,
    params: &CreateAccountParams,
) -> StoreResult<Account> {
    let row = sqlx::query(
        r#"INSERT INTO accounts (owner, balance, currency) VALUES ($1, $2, $3)
           RETURNING id, owner, balance, currency, created_at"#,
    )
    .bind(&params.owner)
    .bind(params.balance)
    .bind(params.currency.as_str())
    .fetch_one(&mut *conn)
    .await?;

    account_from_row(&row)
}

pub async fn get_account(conn: &mut PgConnection, id: i64) -> StoreResult<Account> {
    let row = sqlx::query(
        r#"SELECT id, owner, balance, currency, created_at
           FROM accounts WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;

    account_from_row(&row)
}

pub async fn list_accounts(conn: &mut PgConnection, page: ListParams) -> StoreResult<Vec<Account>> {
    let rows = sqlx::query(
        r#"SELECT id, owner, balance, currency, created_at
           FROM accounts ORDER BY id LIMIT $1 OFFSET $2"#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(account_from_row).collect()
}

pub async fn update_account(
    conn: &mut PgConnection,
    params: UpdateAccountParams,
) -> StoreResult<Account> {
    let row = sqlx::query(
        r#"UPDATE accounts SET balance = $2 WHERE id = $1
           RETURNING id, owner, balance, currency, created_at"#,
    )
    .bind(params.id)
    .bind(params.balance)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;

    account_from_row(&row)
}

/// Single-statement read-modify-write; the row lock it takes is held to the end of
/// the surrounding transaction.
pub async fn add_account_balance(
    conn: &mut PgConnection,
    params: AddAccountBalanceParams,
) -> StoreResult<Account> {
    let row = sqlx::query(
        r#"UPDATE accounts SET balance = balance + $2 WHERE id = $1
           RETURNING id, owner, balance, currency, created_at"#,
    )
    .bind(params.id)
    .bind(params.amount)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;

    account_from_row(&row)
}

pub async fn delete_account(conn: &mut PgConnection, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    expect_affected(result.rows_affected())
}

// ============================================================================
// Entries
// ============================================================================

pub async fn create_entry(
    conn: &mut PgConnection,
    params: CreateEntryParams,
) -> StoreResult<Entry> {
    let row = sqlx::query(
        r#"INSERT INTO entries (account_id, amount) VALUES ($1, $2)
           RETURNING id, account_id, amount, created_at"#,
    )
    .bind(params.account_id)
    .bind(params.amount)
    .fetch_one(&mut *conn)
    .await?;

    entry_from_row(&row)
}

pub async fn get_entry(conn: &mut PgConnection, id: i64) -> StoreResult<Entry> {
    let row = sqlx::query("SELECT id, account_id, amount, created_at FROM entries WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound)?;

    entry_from_row(&row)
}

pub async fn list_entries(conn: &mut PgConnection, page: ListParams) -> StoreResult<Vec<Entry>> {
    let rows = sqlx::query(
        r#"SELECT id, account_id, amount, created_at
           FROM entries ORDER BY id LIMIT $1 OFFSET $2"#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

pub async fn update_entry(
    conn: &mut PgConnection,
    params: UpdateEntryParams,
) -> StoreResult<Entry> {
    let row = sqlx::query(
        r#"UPDATE entries SET amount = $2 WHERE id = $1
           RETURNING id, account_id, amount, created_at"#,
    )
    .bind(params.id)
    .bind(params.amount)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;

    entry_from_row(&row)
}

pub async fn delete_entry(conn: &mut PgConnection, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM entries WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    expect_affected(result.rows_affected())
}

// ============================================================================
// Transfers
// ============================================================================

pub async fn create_transfer(
    conn: &mut PgConnection,
    params: CreateTransferParams,
) -> StoreResult<Transfer> {
    let row = sqlx::query(
        r#"INSERT INTO transfers (from_account_id, to_account_id, amount) VALUES ($1, $2, $3)
           RETURNING id, from_account_id, to_account_id, amount, created_at"#,
    )
    .bind(params.from_account_id)
    .bind(params.to_account_id)
    .bind(params.amount)
    .fetch_one(&mut *conn)
    .await?;

    transfer_from_row(&row)
}

pub async fn get_transfer(conn: &mut PgConnection, id: i64) -> StoreResult<Transfer> {
    let row = sqlx::query(
        r#"SELECT id, from_account_id, to_account_id, amount, created_at
           FROM transfers WHERE id = $1"#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;

    transfer_from_row(&row)
}

pub async fn list_transfers(
    conn: &mut PgConnection,
    page: ListParams,
) -> StoreResult<Vec<Transfer>> {
    let rows = sqlx::query(
        r#"SELECT id, from_account_id, to_account_id, amount, created_at
           FROM transfers ORDER BY id LIMIT $1 OFFSET $2"#,
    )
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(transfer_from_row).collect()
}

pub async fn update_transfer(
    conn: &mut PgConnection,
    params: UpdateTransferParams,
) -> StoreResult<Transfer> {
    let row = sqlx::query(
        r#"UPDATE transfers SET amount = $2 WHERE id = $1
           RETURNING id, from_account_id, to_account_id, amount, created_at"#,
    )
    .bind(params.id)
    .bind(params.amount)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound)?;

    transfer_from_row(&row)
}

pub async fn delete_transfer(conn: &mut PgConnection, id: i64) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM transfers WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    expect_affected(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_affected() {
        assert!(expect_affected(1).is_ok());
        assert!(matches!(expect_affected(0), Err(StoreError::NotFound)));
    }
}
