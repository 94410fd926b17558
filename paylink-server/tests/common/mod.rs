//! Common test utilities for server integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use paylink_server::{routes, AppState, PaymentDefaults, SqliteStore};
use serde_json::{json, Value};

pub const BASE_URL: &str = "https://pay.example.com";
pub const LEGACY_TOKEN: &str = "legacy-link-token";

/// Create a test server over a fresh in-memory store.
///
/// The store handle is returned so tests can arrange rows the API cannot
/// create, such as already-expired links.
pub fn create_test_server() -> (TestServer, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("Failed to open store"));
    store.migrate(LEGACY_TOKEN).expect("Failed to migrate store");

    let state = Arc::new(AppState::new(
        store.clone(),
        BASE_URL,
        PaymentDefaults {
            amount: 1000.0,
            due_in_days: 7,
        },
    ));

    let app = routes::create_router(state);
    let server = TestServer::new(app).expect("Failed to create test server");

    (server, store)
}

/// Create a client through the admin API and return its id
pub async fn create_client(server: &TestServer, name: &str) -> i64 {
    let response = server
        .post("/api/admin/clients")
        .json(&json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "phone": "9876543210",
            "company": "Example Ltd",
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    body["data"]["id"].as_i64().expect("client id")
}

/// Issue a link for a client and return the response body's `data`
pub async fn issue_link(server: &TestServer, client_id: i64) -> Value {
    let response = server
        .post("/api/admin/client-links")
        .json(&json!({ "clientId": client_id }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: Value = response.json();
    body["data"].clone()
}

/// Register a payment and return the response body
pub async fn submit_payment(server: &TestServer, client_id: &str, project: &str) -> Value {
    let response = server
        .post("/api/payment/submit")
        .json(&json!({
            "clientName": "Acme Corp",
            "projectName": project,
            "clientId": client_id,
            "amount": 2500.0,
            "dueDate": "2026-12-01",
            "receiptUrl": "/receipts/acme.pdf",
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    response.json()
}
