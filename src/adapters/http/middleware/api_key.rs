//! Shared-secret gate for the server-side API.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;

use crate::adapters::http::error::ApiError;
use crate::context::ServerContext;
use crate::domain::auth::constant_time_compare;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` is not the shared secret.
pub async fn api_key_middleware(
    State(context): State<Arc<ServerContext>>,
    request: Request,
    next: Next,
) -> Response {
    if !key_matches(request.headers(), context.secret.expose_secret()) {
        tracing::warn!(path = %request.uri().path(), "API request with invalid key");
        return ApiError::Unauthorized("Unauthorized".to_string()).into_response();
    }
    next.run(request).await
}

fn key_matches(headers: &HeaderMap, secret: &str) -> bool {
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    !presented.is_empty() && constant_time_compare(presented.as_bytes(), secret.as_bytes())
}
