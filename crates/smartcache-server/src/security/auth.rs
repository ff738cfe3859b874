//! API key authentication middleware
//!
//! TigerStyle: Constant-time key comparison, explicit public paths.
//!
//! When a key is configured every route except the public ones requires it
//! in the `X-API-Key` header. With no key configured, authentication is off.

use crate::models::ErrorResponse;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Paths that never require authentication
pub const PUBLIC_PATHS: &[&str] = &["/health"];

/// API key authentication configuration
#[derive(Debug, Clone, Default)]
pub struct ApiKeyAuth {
    api_key: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(api_key: Option<String>) -> Self {
        match &api_key {
            Some(_) => tracing::info!("API key authentication enabled"),
            None => tracing::warn!("API key authentication disabled (no key configured)"),
        }
        Self { api_key }
    }

    /// Whether a request to `path` must carry the key
    pub fn requires_auth(&self, path: &str) -> bool {
        self.is_enabled() && !PUBLIC_PATHS.contains(&path)
    }

    /// Constant-time comparison against the configured key
    pub fn validate(&self, provided_key: &str) -> bool {
        match &self.api_key {
            Some(expected) => provided_key.as_bytes().ct_eq(expected.as_bytes()).into(),
            None => true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Authentication failure
#[derive(Debug)]
pub enum AuthError {
    /// No key supplied
    Missing,
    /// Key supplied but wrong
    Invalid,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::Missing => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("unauthorized", "Missing X-API-Key header"),
            ),
            AuthError::Invalid => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new("forbidden", "Invalid API key"),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Reject requests without a valid `X-API-Key`
pub async fn api_key_auth_middleware(
    State(auth): State<Arc<ApiKeyAuth>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if !auth.requires_auth(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let provided_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::Missing)?;

    if !auth.validate(provided_key) {
        tracing::debug!(path = request.uri().path(), "Rejected request with invalid API key");
        return Err(AuthError::Invalid);
    }

    Ok(next.run(request).await)
}
