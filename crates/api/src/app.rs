use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};

use artmarket_policy::PolicyConfig;

use crate::context::SessionContext;
use crate::guard::{self, Guard};
use crate::middleware::{SessionState, session_middleware};
use crate::session::Hs256SessionVerifier;

/// Assemble the marketplace router: public pages, plus route groups guarded
/// by the predefined permission middleware.
pub fn build_app(session_secret: String) -> Router {
    let config = Arc::new(PolicyConfig::marketplace());
    let session_state = SessionState {
        verifier: Arc::new(Hs256SessionVerifier::new(session_secret.as_bytes())),
    };

    let dashboard = Router::new()
        .route("/dashboard", get(dashboard))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(config.clone(), guard::require_auth()),
            Guard::enforce,
        ));

    let studio = Router::new()
        .route("/studio", get(studio))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(config.clone(), guard::require_artwork_create()),
            Guard::enforce,
        ));

    let orders = Router::new()
        .route("/orders", get(orders))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(config.clone(), guard::require_order_management()),
            Guard::enforce,
        ));

    let admin = Router::new()
        .route("/admin", get(admin_home))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(config.clone(), guard::require_admin()),
            Guard::enforce,
        ));

    let admin_users = Router::new()
        .route("/admin/users", get(admin_users))
        .route_layer(middleware::from_fn_with_state(
            Guard::new(config.clone(), guard::require_user_management()),
            Guard::enforce,
        ));

    // Everything below sees a SessionContext; guests included.
    let session_scoped = Router::new()
        .route("/whoami", get(whoami))
        .route("/gallery", get(gallery))
        .merge(dashboard)
        .merge(studio)
        .merge(orders)
        .merge(admin)
        .merge(admin_users)
        .layer(middleware::from_fn_with_state(
            session_state,
            session_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(session_scoped)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn whoami(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "subject": session.subject().map(|s| s.to_string()),
        "role": session.role().as_str(),
        "authenticated": session.is_authenticated(),
    }))
}

async fn gallery() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "gallery" }))
}

async fn dashboard() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "dashboard" }))
}

async fn studio() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "studio" }))
}

async fn orders() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "orders" }))
}

async fn admin_home() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "admin" }))
}

async fn admin_users() -> impl IntoResponse {
    Json(serde_json::json!({ "page": "admin-users" }))
}
