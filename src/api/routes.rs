//! Route configuration.
//!
//! Every route here must have a matching entry in
//! [`crate::gateway::policy::ROUTES`]; the gateway middleware refuses
//! anything the policy table does not know.

use axum::{
    Router, middleware,
    response::Response,
    routing::{delete, get, post},
};

use crate::api::handlers::{
    admin_reports_handler, compare_handler, login_handler, otp_verify_handler,
    photo_delete_handler, photo_upload_handler, profile_delete_handler, profile_get_handler,
    profile_update_handler, profile_view_handler, search_handler,
};
use crate::api::middleware::{gateway, tracing};
use crate::gateway::sanitize;
use crate::state::AppState;

/// The full application router with the gateway stack applied.
///
/// Layer order (outermost first): tracing, response sanitizer, gateway
/// pipeline. The sanitizer wraps the pipeline so that rejection responses
/// are scrubbed too.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(login_handler))
        .route("/auth/otp/verify", post(otp_verify_handler))
        .route(
            "/user-personal",
            get(profile_get_handler).put(profile_update_handler),
        )
        .route("/user-personal/upload/photos", post(photo_upload_handler))
        .route(
            "/user-personal/upload/photos/{photo_id}",
            delete(photo_delete_handler),
        )
        .route(
            "/profiles/{user_id}",
            get(profile_view_handler).delete(profile_delete_handler),
        )
        .route("/search", get(search_handler))
        .route("/compare", post(compare_handler))
        .route("/admin/reports", get(admin_reports_handler))
        .fallback(fallback_handler)
        .layer(middleware::from_fn_with_state(state.clone(), gateway::layer))
        .layer(middleware::from_fn(sanitize::layer))
        .layer(tracing::layer())
        .with_state(state)
}

/// Fixed 404 for anything outside the route table.
async fn fallback_handler() -> Response {
    sanitize::not_found()
}
