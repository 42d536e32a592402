//! Ledger Store server
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │ Gateway  │───▶│ Service  │───▶│ Transfer │───▶│ Postgres │
//! │  (axum)  │    │ (facade) │    │  Engine  │    │  (sqlx)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `ledger_store [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;

use ledger_store::config::AppConfig;
use ledger_store::db::{Database, PgStore};
use ledger_store::gateway::{self, AppState};
use ledger_store::logging::init_logging;
use ledger_store::service::LedgerService;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _guard = init_logging(&config);
    tracing::info!(env = %env, "Starting ledger store");

    let postgres_url = config
        .postgres_url
        .clone()
        .context("postgres_url is not configured (set it in the config file or DATABASE_URL)")?;

    let db = Database::connect(&postgres_url, &config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.init_schema()
        .await
        .context("Failed to initialize schema")?;

    let store = Arc::new(PgStore::new(db.pool().clone()));
    let service = Arc::new(LedgerService::new(store, config.ledger.clone()));
    let state = AppState::new(service, config.ledger.default_page_size);

    let served = gateway::run_server(&config.gateway, state).await;

    db.close().await;
    served
}
