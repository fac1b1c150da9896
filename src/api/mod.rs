//! HTTP API.
//!
//! ```text
//! GET  /healthz
//! GET  /v1-secrets
//! POST /v1-secrets/secrets/create[?action=bulk]
//! POST /v1-secrets/secrets/rewrap[?action=bulk]
//! POST /v1-secrets/secrets/purge[?action=bulk]
//! ```

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::core::service::SecretService;

pub use error::{ApiError, ErrorResponse};

/// Build the API router around a shared service.
pub fn build_router(service: Arc<SecretService>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/v1-secrets", get(handlers::api_version))
        .route("/v1-secrets/secrets/create", post(handlers::create))
        .route("/v1-secrets/secrets/rewrap", post(handlers::rewrap))
        .route("/v1-secrets/secrets/purge", post(handlers::purge))
        .fallback(handlers::not_found)
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
