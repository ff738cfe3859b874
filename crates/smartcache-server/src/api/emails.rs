//! Breached email routes

use super::ApiError;
use crate::models::{EmailQuery, EmailStatus};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use smartcache_runtime::BatchResult;

/// GET /checkemail/:email
///
/// 200 when breached, 404 otherwise.
pub async fn check_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<(StatusCode, Json<EmailStatus>), ApiError> {
    let breached = state.service().check(&email).await?;
    let status = if breached {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(EmailStatus { email, breached })))
}

/// POST /addemail?email=
///
/// 201 on the transition, 409 if already breached.
pub async fn add_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<(StatusCode, Json<EmailStatus>), ApiError> {
    if !state.service().add(&query.email).await? {
        return Err(ApiError::conflict(format!(
            "{} is already marked breached",
            query.email
        )));
    }
    Ok((
        StatusCode::CREATED,
        Json(EmailStatus {
            email: query.email,
            breached: true,
        }),
    ))
}

/// POST /addemails with a JSON array of emails
pub async fn add_emails(
    State(state): State<AppState>,
    Json(emails): Json<Vec<String>>,
) -> Result<Json<BatchResult>, ApiError> {
    let result = state.service().add_batch(&emails).await?;
    Ok(Json(result))
}

/// POST /deleteemail?email=
pub async fn delete_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<EmailStatus>, ApiError> {
    state.service().remove(&query.email).await?;
    Ok(Json(EmailStatus {
        email: query.email,
        breached: false,
    }))
}
