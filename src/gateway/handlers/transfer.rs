//! Transfer handlers

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};

use super::super::state::AppState;
use super::super::types::{ApiResult, PageQuery, TransferRequest, created, ok};
use crate::models::{Transfer, TransferTxResult};

/// Move money between two accounts
///
/// POST /transfers
///
/// Creates the transfer record, one entry per account and updates both balances
/// atomically.
#[utoipa::path(
    post,
    path = "/transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer committed", body = TransferTxResult, content_type = "application/json"),
        (status = 400, description = "Non-positive amount or same account"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal error, nothing was applied")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferTxResult> {
    let Json(req) = payload?;
    let result = state
        .ledger
        .transfer(req.from_account_id, req.to_account_id, req.amount)
        .await?;
    created(result)
}

/// Get one transfer
///
/// GET /transfer/{id}
#[utoipa::path(
    get,
    path = "/transfer/{id}",
    params(
        ("id" = i64, Path, description = "Transfer ID")
    ),
    responses(
        (status = 200, description = "Transfer details", body = Transfer, content_type = "application/json"),
        (status = 400, description = "Invalid transfer ID"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfer"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Transfer> {
    let Path(id) = id?;
    ok(state.ledger.get_transfer(id).await?)
}

/// List transfers by id ascending
///
/// GET /transfers?page_id=1&page_size=5
#[utoipa::path(
    get,
    path = "/transfers",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of transfers", body = [Transfer], content_type = "application/json"),
        (status = 400, description = "Invalid page parameters")
    ),
    tag = "Transfer"
)]
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<Transfer>> {
    let Query(query) = query?;
    let (page_id, page_size) = query.resolve(state.default_page_size);
    ok(state.ledger.list_transfers(page_id, page_size).await?)
}
