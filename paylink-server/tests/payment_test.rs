//! Tests for payment registration and the admin payment endpoints

mod common;

use common::{create_test_server, submit_payment};
use paylink_core::ReferenceId;
use serde_json::{json, Value};

/// Test: registration generates a well-formed reference id and starts pending
#[tokio::test]
async fn test_submit_payment_generates_reference() {
    let (server, _store) = create_test_server();

    let body = submit_payment(&server, "42", "Brand Refresh").await;

    assert_eq!(body["success"], true);
    let reference = body["referenceId"].as_str().unwrap();
    assert!(ReferenceId::parse(reference).is_some(), "bad reference {}", reference);
    assert_eq!(body["data"]["referenceId"], reference);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["dueDate"], "2026-12-01");
}

/// Test: reference ids differ between registrations
#[tokio::test]
async fn test_reference_ids_unique() {
    let (server, _store) = create_test_server();

    let a = submit_payment(&server, "1", "Site").await;
    let b = submit_payment(&server, "1", "Site").await;

    assert_ne!(a["referenceId"], b["referenceId"]);
}

#[tokio::test]
async fn test_submit_payment_validation() {
    let (server, _store) = create_test_server();

    let response = server
        .post("/api/payment/submit")
        .json(&json!({ "clientName": "Acme", "amount": 0 }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["errors"]["amount"].is_string());
    assert!(body["errors"]["dueDate"].is_string());
    assert!(body["errors"]["projectName"].is_string());
}

/// Test: page 2 of 15 rows with limit 10 holds 5 rows
#[tokio::test]
async fn test_pagination() {
    let (server, _store) = create_test_server();
    for i in 0..15 {
        submit_payment(&server, "7", &format!("Project {}", i)).await;
    }

    let response = server.get("/api/admin/payments?page=2&limit=10").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["pagination"]["total"], 15);
    assert_eq!(body["pagination"]["page"], 2);
}

#[tokio::test]
async fn test_status_filter() {
    let (server, _store) = create_test_server();
    let first = submit_payment(&server, "7", "One").await;
    submit_payment(&server, "7", "Two").await;

    let id = first["data"]["id"].as_i64().unwrap();
    let response = server
        .put(&format!("/api/admin/payments/{}/status", id))
        .json(&json!({ "status": "verified" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = server.get("/api/admin/payments?status=verified").await;
    let body: Value = response.json();
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id);

    let response = server.get("/api/admin/payments?status=all").await;
    let body: Value = response.json();
    assert_eq!(body["pagination"]["total"], 2);

    let response = server.get("/api/admin/payments?status=approved").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_get_payment() {
    let (server, _store) = create_test_server();
    let created = submit_payment(&server, "7", "One").await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = server.get(&format!("/api/admin/payments/{}", id)).await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["projectName"], "One");

    let response = server.get("/api/admin/payments/9999").await;
    assert_eq!(response.status_code(), 404);
}

/// Test: malformed path and query values get the JSON error envelope
#[tokio::test]
async fn test_bad_path_and_query_values() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/admin/payments/seven").await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["errors"]["path"].is_string());

    let response = server.get("/api/admin/payments?page=two").await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["errors"]["query"].is_string());
}

#[tokio::test]
async fn test_update_status_errors() {
    let (server, _store) = create_test_server();
    let created = submit_payment(&server, "7", "One").await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/api/admin/payments/{}/status", id))
        .json(&json!({ "status": "paid" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = server
        .put("/api/admin/payments/9999/status")
        .json(&json!({ "status": "rejected" }))
        .await;
    assert_eq!(response.status_code(), 404);
}

/// Test: search matches any of the four text columns, case-insensitively
#[tokio::test]
async fn test_search() {
    let (server, _store) = create_test_server();
    let created = submit_payment(&server, "client-77", "Brand Refresh").await;
    submit_payment(&server, "client-88", "Mobile App").await;

    let response = server.get("/api/admin/payments/search?query=BRAND").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let reference = created["referenceId"].as_str().unwrap();
    let response = server
        .get(&format!("/api/admin/payments/search?query={}", reference))
        .await;
    let body: Value = response.json();
    assert_eq!(body["data"][0]["referenceId"], reference);

    let response = server.get("/api/admin/payments/search?query=client-").await;
    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_search_query_too_short() {
    let (server, _store) = create_test_server();

    let response = server.get("/api/admin/payments/search?query=ab").await;
    assert_eq!(response.status_code(), 400);

    let response = server.get("/api/admin/payments/search").await;
    assert_eq!(response.status_code(), 400);
}
