//! Black-box HTTP tests: a real axum server over the in-process store

mod common;

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use ledger_store::config::LedgerConfig;
use ledger_store::gateway::{AppState, build_router};
use ledger_store::service::LedgerService;
use ledger_store::store::MemoryStore;

/// Start a server on an ephemeral port and return its base URL.
async fn spawn_server() -> String {
    let config = LedgerConfig::default();
    let service = Arc::new(LedgerService::new(Arc::new(MemoryStore::new()), config.clone()));
    let app = build_router(AppState::new(service, config.default_page_size));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn create_account(client: &reqwest::Client, base: &str, owner: &str) -> Value {
    let resp = client
        .post(format!("{}/account", base))
        .json(&json!({ "owner": owner, "currency": "USD" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

#[tokio::test]
async fn test_account_lifecycle() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let owner = common::random_owner();

    let account = create_account(&client, &base, &owner).await;
    assert_eq!(account["owner"], owner.as_str());
    assert_eq!(account["balance"], 0);
    assert_eq!(account["currency"], "USD");
    let id = account["id"].as_i64().unwrap();

    let resp = client
        .get(format!("{}/account/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], 0);
    assert_eq!(body["msg"], "ok");
    assert_eq!(body["data"], account);

    let resp = client
        .delete(format!("{}/account/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/account/{}", base, id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_ne!(body["code"], 0);
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn test_create_account_validation() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    for payload in [
        json!({ "owner": "alice", "currency": "GBP" }),
        json!({ "owner": "", "currency": "USD" }),
        json!({ "currency": "USD" }),
    ] {
        let resp = client
            .post(format!("{}/account", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "payload {}", payload);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], 1001);
    }
}

#[tokio::test]
async fn test_get_account_bad_ids() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    for (path, status) in [
        ("abc", StatusCode::BAD_REQUEST),
        ("0", StatusCode::BAD_REQUEST),
        ("-1", StatusCode::BAD_REQUEST),
        ("999999", StatusCode::NOT_FOUND),
    ] {
        let resp = client
            .get(format!("{}/account/{}", base, path))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), status, "path {}", path);
    }
}

#[tokio::test]
async fn test_list_accounts_pagination() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    for _ in 0..7 {
        create_account(&client, &base, &common::random_owner()).await;
    }

    let page = |page_id: i64| {
        let client = client.clone();
        let url = format!("{}/accounts?page_id={}&page_size=5", base, page_id);
        async move {
            let resp = client.get(url).send().await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = resp.json().await.unwrap();
            body["data"].as_array().unwrap().clone()
        }
    };

    let first = page(1).await;
    let second = page(2).await;
    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 2);
    assert!(first[4]["id"].as_i64() < second[0]["id"].as_i64());

    for query in ["page_id=0&page_size=5", "page_id=1&page_size=0", "page_id=x"] {
        let resp = client
            .get(format!("{}/accounts?{}", base, query))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "query {}", query);
    }

    // Defaults: first page of the configured size
    let resp = client.get(format!("{}/accounts", base)).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_transfer_round_trip() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &base, "alice").await["id"].as_i64().unwrap();
    let b = create_account(&client, &base, "bob").await["id"].as_i64().unwrap();

    let resp = client
        .post(format!("{}/transfers", base))
        .json(&json!({ "from_account_id": a, "to_account_id": b, "amount": 40 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["transfer"]["amount"], 40);
    assert_eq!(data["from_entry"]["amount"], -40);
    assert_eq!(data["to_entry"]["amount"], 40);
    assert_eq!(data["from_account"]["balance"], -40);
    assert_eq!(data["to_account"]["balance"], 40);

    let transfer_id = data["transfer"]["id"].as_i64().unwrap();
    let entry_id = data["to_entry"]["id"].as_i64().unwrap();

    let resp = client
        .get(format!("{}/transfer/{}", base, transfer_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], data["transfer"]);

    let resp = client
        .get(format!("{}/entry/{}", base, entry_id))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["account_id"], b);

    let resp = client.get(format!("{}/transfers", base)).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = client.get(format!("{}/entries", base)).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // History pins the account
    let resp = client
        .delete(format!("{}/account/{}", base, a))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_transfer_rejections() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let a = create_account(&client, &base, "alice").await["id"].as_i64().unwrap();

    for (payload, status) in [
        (
            json!({ "from_account_id": a, "to_account_id": a, "amount": 10 }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "from_account_id": a, "to_account_id": a + 1000, "amount": 0 }),
            StatusCode::BAD_REQUEST,
        ),
        (
            json!({ "from_account_id": a, "to_account_id": a + 1000, "amount": 10 }),
            StatusCode::NOT_FOUND,
        ),
        (
            json!({ "from_account_id": a, "amount": 10 }),
            StatusCode::BAD_REQUEST,
        ),
    ] {
        let resp = client
            .post(format!("{}/transfers", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), status, "payload {}", payload);
    }

    let resp = client
        .get(format!("{}/account/{}", base, a))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["balance"], 0);
}

#[tokio::test]
async fn test_health_and_docs() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["timestamp_ms"].as_u64().unwrap() > 0);

    let resp = client
        .get(format!("{}/api-docs/openapi.json", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Value = resp.json().await.unwrap();
    assert!(doc["paths"].get("/transfers").is_some());
}
