//! Business handler stubs behind the gateway.
//!
//! Real matchmaking logic (credential checks, profile storage, photo
//! handling, compatibility scoring) lives in downstream services. These
//! handlers exist to exercise the collaborator boundary: they receive only
//! the canonical request and the verified principal, never the raw request.

use axum::{Extension, Json};
use serde_json::{Value, json};

use crate::gateway::auth::Principal;
use crate::gateway::canonical::CanonicalRequest;

/// `POST /auth/login`
pub async fn login_handler(Extension(canonical): Extension<CanonicalRequest>) -> Json<Value> {
    // Credential verification is the auth service's job; by the time the
    // body reaches it, email and password are single typed scalars.
    let has_email = canonical
        .body
        .as_object()
        .is_some_and(|fields| fields.contains_key("email"));
    Json(json!({"status": "accepted", "credentials_present": has_email}))
}

/// `POST /auth/otp/verify`
pub async fn otp_verify_handler(Extension(canonical): Extension<CanonicalRequest>) -> Json<Value> {
    let has_otp = canonical
        .body
        .as_object()
        .is_some_and(|fields| fields.contains_key("otp"));
    Json(json!({"status": "accepted", "otp_present": has_otp}))
}

/// `GET /user-personal`
pub async fn profile_get_handler(Extension(principal): Extension<Principal>) -> Json<Value> {
    Json(json!({"user_id": principal.user_id, "email": principal.email}))
}

/// `PUT /user-personal`
pub async fn profile_update_handler(
    Extension(principal): Extension<Principal>,
    Extension(canonical): Extension<CanonicalRequest>,
) -> Json<Value> {
    let field_count = canonical.body.as_object().map_or(0, |fields| fields.len());
    Json(json!({"user_id": principal.user_id, "updated_fields": field_count}))
}

/// `POST /user-personal/upload/photos`
pub async fn photo_upload_handler(Extension(principal): Extension<Principal>) -> Json<Value> {
    Json(json!({"user_id": principal.user_id, "status": "queued"}))
}

/// `DELETE /user-personal/upload/photos/{photo_id}`
pub async fn photo_delete_handler(
    Extension(principal): Extension<Principal>,
    Extension(canonical): Extension<CanonicalRequest>,
) -> Json<Value> {
    // The storage service scopes the delete to the principal; a photo id
    // belonging to someone else is simply not found there.
    Json(json!({
        "user_id": principal.user_id,
        "photo_id": canonical.route_params.get("photo_id"),
        "status": "deleted"
    }))
}

/// `GET /profiles/{user_id}` - public-read browse.
pub async fn profile_view_handler(
    Extension(canonical): Extension<CanonicalRequest>,
) -> Json<Value> {
    Json(json!({"profile": canonical.route_params.get("user_id")}))
}

/// `DELETE /profiles/{user_id}` - owner or admin only.
pub async fn profile_delete_handler(
    Extension(canonical): Extension<CanonicalRequest>,
) -> Json<Value> {
    Json(json!({"deleted": canonical.route_params.get("user_id")}))
}

/// `GET /search`
pub async fn search_handler(Extension(canonical): Extension<CanonicalRequest>) -> Json<Value> {
    let filters: Value = canonical
        .query
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null)))
        .collect::<serde_json::Map<_, _>>()
        .into();
    Json(json!({"results": [], "filters": filters}))
}

/// `POST /compare`
pub async fn compare_handler(Extension(canonical): Extension<CanonicalRequest>) -> Json<Value> {
    let count = canonical
        .body
        .as_object()
        .and_then(|fields| fields.get("profiles"))
        .and_then(|v| v.as_list())
        .map_or(0, <[_]>::len);
    Json(json!({"compared": count}))
}

/// `GET /admin/reports`
pub async fn admin_reports_handler(Extension(principal): Extension<Principal>) -> Json<Value> {
    Json(json!({"requested_by": principal.user_id, "reports": []}))
}
