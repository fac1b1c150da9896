//! Request handlers.
//!
//! Bodies are taken as raw bytes and parsed here so that malformed JSON gets
//! the same error body as every other failure.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ApiError, ErrorResponse};
use crate::core::constants::API_VERSION;
use crate::core::domain::{BulkSecret, Payload, Secret};
use crate::core::service::SecretService;
use crate::error::ValidationError;

const BULK_ACTION: &str = "bulk";

/// Query string accepted by the secret endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

impl ActionQuery {
    fn is_bulk(&self) -> Result<bool, ValidationError> {
        match self.action.as_deref() {
            None | Some("") => Ok(false),
            Some(BULK_ACTION) => Ok(true),
            Some(other) => Err(ValidationError::UnsupportedAction(other.to_string())),
        }
    }
}

/// Resolve a request body into its single or bulk form.
pub fn parse_payload(body: &[u8], bulk: bool) -> Result<Payload, ValidationError> {
    let malformed = |e: serde_json::Error| {
        ValidationError::MalformedBody(format!(
            "{:?} error at line {} column {}",
            e.classify(),
            e.line(),
            e.column()
        ))
    };

    if bulk {
        serde_json::from_slice::<BulkSecret>(body)
            .map(Payload::Bulk)
            .map_err(malformed)
    } else {
        serde_json::from_slice::<Secret>(body)
            .map(Payload::Single)
            .map_err(malformed)
    }
}

fn respond(payload: Payload) -> Response {
    match payload {
        Payload::Single(secret) => Json(secret).into_response(),
        Payload::Bulk(bulk) => Json(bulk).into_response(),
    }
}

pub async fn create(
    State(service): State<Arc<SecretService>>,
    Query(query): Query<ActionQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_payload(&body, query.is_bulk()?)?;
    debug!(count = payload.len(), "create request");
    Ok(respond(service.create(payload).await?))
}

pub async fn rewrap(
    State(service): State<Arc<SecretService>>,
    Query(query): Query<ActionQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_payload(&body, query.is_bulk()?)?;
    debug!(count = payload.len(), "rewrap request");
    Ok(respond(service.rewrap(payload).await?))
}

pub async fn purge(
    State(service): State<Arc<SecretService>>,
    Query(query): Query<ActionQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload = parse_payload(&body, query.is_bulk()?)?;
    debug!(count = payload.len(), "purge request");
    Ok(Json(service.purge(payload).await?).into_response())
}

/// API version descriptor.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiVersion {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

pub async fn api_version() -> Json<ApiVersion> {
    Json(ApiVersion {
        kind: "apiVersion".to_string(),
        id: API_VERSION.to_string(),
    })
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn not_found() -> Response {
    ErrorResponse::not_found()
}
