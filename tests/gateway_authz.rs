mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_owner_can_delete_own_profile() {
    let server = common::test_server();

    let response = server
        .delete("/profiles/u1")
        .add_header("authorization", common::bearer("u1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["deleted"], "u1");
}

#[tokio::test]
async fn test_cross_user_delete_is_forbidden() {
    let server = common::test_server();

    let response = server
        .delete("/profiles/u2")
        .add_header("authorization", common::bearer("u1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn test_admin_can_delete_any_profile() {
    let server = common::test_server();

    let response = server
        .delete("/profiles/u2")
        .add_header("authorization", common::admin_bearer("admin1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_browse_endpoint_allows_cross_user_read() {
    let server = common::test_server();

    let response = server
        .get("/profiles/u2")
        .add_header("authorization", common::bearer("u1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_route_rejects_member() {
    let server = common::test_server();

    let response = server
        .get("/admin/reports")
        .add_header("authorization", common::bearer("u1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_route_admits_admin() {
    let server = common::test_server();

    let response = server
        .get("/admin/reports")
        .add_header("authorization", common::admin_bearer("admin1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_payload_identity_fields_never_elevate() {
    // The same request with and without identity claims in the body must
    // authorize identically: the decision reads only token claims and the
    // route.
    let server = common::test_server();

    let plain = server
        .delete("/profiles/u2")
        .add_header("authorization", common::bearer("u1"))
        .await;

    let boosted = server
        .delete("/profiles/u2")
        .add_header("authorization", common::bearer("u1"))
        .json(&json!({"role": "admin", "isAdmin": true, "user_id": "u2"}))
        .await;

    assert_eq!(plain.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(boosted.status_code(), plain.status_code());
}

#[tokio::test]
async fn test_query_role_field_never_elevates() {
    let server = common::test_server();

    let response = server
        .get("/admin/reports?role=admin")
        .add_header("authorization", common::bearer("u1"))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
