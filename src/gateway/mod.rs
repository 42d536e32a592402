//! HTTP gateway over the ledger facade

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
pub use state::AppState;

/// Build the complete router: ledger routes, health check and Swagger UI.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Accounts
        .route("/account", post(handlers::create_account))
        .route(
            "/account/{id}",
            get(handlers::get_account).delete(handlers::delete_account),
        )
        .route("/accounts", get(handlers::list_accounts))
        // Transfers
        .route(
            "/transfers",
            post(handlers::create_transfer).get(handlers::list_transfers),
        )
        .route("/transfer/{id}", get(handlers::get_transfer))
        // Entries
        .route("/entry/{id}", get(handlers::get_entry))
        .route("/entries", get(handlers::list_entries))
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve until Ctrl-C, then drain in-flight requests.
pub async fn run_server(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        )
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl-C handler: {}", e);
        // Without a handler, keep serving until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
