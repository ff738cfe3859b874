//! REST API routes
//!
//! TigerStyle: Thin handlers over the breach service, errors mapped in one place.

pub mod emails;

use crate::models::{ErrorResponse, HealthResponse};
use crate::security::{api_key_auth_middleware, ApiKeyAuth};
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use smartcache_core::Error;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router
pub fn router(state: AppState, auth: ApiKeyAuth) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/checkemail/:email", get(emails::check_email))
        .route("/addemail", post(emails::add_email))
        .route("/addemails", post(emails::add_emails))
        .route("/deleteemail", post(emails::delete_email))
        .layer(middleware::from_fn_with_state(
            Arc::new(auth),
            api_key_auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_keys: state.service().stats().active_count,
    })
}

/// Error returned by handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorResponse::bad_request(message),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            body: ErrorResponse::new("conflict", message),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: ErrorResponse::new("unavailable", message),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorResponse::internal(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_validation() {
            return ApiError::bad_request(err.to_string());
        }
        if err.is_retriable() || matches!(err, Error::RuntimeShutdown) {
            tracing::warn!(error = %err, "Request failed, reporting unavailable");
            return ApiError::unavailable(err.to_string());
        }
        tracing::error!(error = %err, "Request failed");
        ApiError::internal(err.to_string())
    }
}
