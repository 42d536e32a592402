//! Account handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};

use super::super::state::AppState;
use super::super::types::{
    ApiResult, CreateAccountRequest, DeletedData, PageQuery, created, ok,
};
use crate::models::Account;

/// Open a new account with zero balance
///
/// POST /account
#[utoipa::path(
    post,
    path = "/account",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = Account, content_type = "application/json"),
        (status = 400, description = "Missing owner or unsupported currency"),
        (status = 500, description = "Internal error")
    ),
    tag = "Account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> ApiResult<Account> {
    let Json(req) = payload?;
    let account = state
        .ledger
        .create_account(&req.owner, &req.currency)
        .await?;
    created(account)
}

/// Get one account
///
/// GET /account/{id}
#[utoipa::path(
    get,
    path = "/account/{id}",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account details", body = Account, content_type = "application/json"),
        (status = 400, description = "Invalid account ID"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Account> {
    let Path(id) = id?;
    ok(state.ledger.get_account(id).await?)
}

/// List accounts by id ascending
///
/// GET /accounts?page_id=1&page_size=5
#[utoipa::path(
    get,
    path = "/accounts",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of accounts", body = [Account], content_type = "application/json"),
        (status = 400, description = "Invalid page parameters")
    ),
    tag = "Account"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<Account>> {
    let Query(query) = query?;
    let (page_id, page_size) = query.resolve(state.default_page_size);
    ok(state.ledger.list_accounts(page_id, page_size).await?)
}

/// Delete an account that has no entries or transfers
///
/// DELETE /account/{id}
#[utoipa::path(
    delete,
    path = "/account/{id}",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account deleted", body = DeletedData, content_type = "application/json"),
        (status = 400, description = "Invalid ID or account has ledger history"),
        (status = 404, description = "Account not found")
    ),
    tag = "Account"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeletedData> {
    let Path(id) = id?;
    state.ledger.delete_account(id).await?;
    ok(DeletedData { id })
}
