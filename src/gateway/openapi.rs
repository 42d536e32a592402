//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::health::HealthResponse;
use crate::gateway::types::{CreateAccountRequest, DeletedData, TransferRequest};
use crate::models::{Account, Currency, Entry, Transfer, TransferTxResult};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ledger Store API",
        version = "1.0.0",
        description = "Accounts, entries and atomic transfers between accounts.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::account::create_account,
        crate::gateway::handlers::account::get_account,
        crate::gateway::handlers::account::list_accounts,
        crate::gateway::handlers::account::delete_account,
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::transfer::get_transfer,
        crate::gateway::handlers::transfer::list_transfers,
        crate::gateway::handlers::entry::get_entry,
        crate::gateway::handlers::entry::list_entries,
    ),
    components(
        schemas(
            HealthResponse,
            Account,
            Currency,
            Entry,
            Transfer,
            TransferTxResult,
            CreateAccountRequest,
            TransferRequest,
            DeletedData,
        )
    ),
    tags(
        (name = "Account", description = "Account lifecycle and queries"),
        (name = "Transfer", description = "Atomic transfers between accounts"),
        (name = "Entry", description = "Per-account balance change records"),
        (name = "System", description = "Health checks")
    )
)]
pub struct ApiDoc;
