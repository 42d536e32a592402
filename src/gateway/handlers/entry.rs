//! Entry handlers (read-only audit trail)

use std::sync::Arc;

use axum::extract::{
    Path, Query, State,
    rejection::{PathRejection, QueryRejection},
};

use super::super::state::AppState;
use super::super::types::{ApiResult, PageQuery, ok};
use crate::models::Entry;

/// GET /entry/{id}
#[utoipa::path(
    get,
    path = "/entry/{id}",
    params(
        ("id" = i64, Path, description = "Entry ID")
    ),
    responses(
        (status = 200, description = "Entry details", body = Entry, content_type = "application/json"),
        (status = 400, description = "Invalid entry ID"),
        (status = 404, description = "Entry not found")
    ),
    tag = "Entry"
)]
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Entry> {
    let Path(id) = id?;
    ok(state.ledger.get_entry(id).await?)
}

/// GET /entries?page_id=1&page_size=5
#[utoipa::path(
    get,
    path = "/entries",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of entries", body = [Entry], content_type = "application/json"),
        (status = 400, description = "Invalid page parameters")
    ),
    tag = "Entry"
)]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<Entry>> {
    let Query(query) = query?;
    let (page_id, page_size) = query.resolve(state.default_page_size);
    ok(state.ledger.list_entries(page_id, page_size).await?)
}
