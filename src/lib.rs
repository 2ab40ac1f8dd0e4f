//! Stackpilot control-plane server
//!
//! HTTP surface over the provisioning engine: service-request intake,
//! catalog and provider-health reads, provisioning runs, and the
//! provider-config override store. Every JSON error response leaves
//! through [`ApiError`], unknown routes included.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod state;
pub mod validation;

pub use error::ApiError;
pub use state::AppState;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

/// Build the API router over shared [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health probes
        .route("/healthz", get(handlers::health::healthz))
        .route("/api/healthz", get(handlers::health::healthz))
        // Catalog and provider status
        .route("/api/providers", get(handlers::catalog::providers))
        .route(
            "/api/provider-health",
            get(handlers::catalog::provider_health),
        )
        .route(
            "/api/provider-config",
            get(handlers::provider_config::get_provider_config)
                .post(handlers::provider_config::update_provider_config),
        )
        // Service requests
        .route(
            "/api/service-requests",
            get(handlers::requests::list_requests),
        )
        .route(
            "/api/service-request",
            post(handlers::requests::create_request),
        )
        .route(
            "/api/provision-request",
            post(handlers::requests::provision_request),
        )
        .route(
            "/api/service-request-status",
            post(handlers::requests::update_request_status),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"ok": false, "error": "Route not found"})),
    )
}
