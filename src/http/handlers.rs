//! Route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::applications::{
    validate_submission, ApplicationError, ApplicationSubmission, PublicApplication,
};
use crate::http::server::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "gatekeeper is running",
    }))
}

/// `POST /api/apply`
pub async fn submit_application(
    State(state): State<AppState>,
    Json(submission): Json<ApplicationSubmission>,
) -> Result<(StatusCode, Json<Value>), ApplicationError> {
    let application = validate_submission(submission)?;

    if let Some(existing) = state.applications.find_by_email(&application.email) {
        return Err(ApplicationError::Duplicate {
            application_id: existing.application_id,
        });
    }

    let stored = state.applications.insert(application)?;
    tracing::info!(application_id = %stored.application_id, "Application submitted");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Application submitted successfully!",
            "application_id": stored.application_id,
        })),
    ))
}

/// `GET /api/apply/{application_id}`
pub async fn lookup_application(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
) -> Result<Json<Value>, ApplicationError> {
    let id = Uuid::parse_str(&application_id).map_err(|_| ApplicationError::NotFound)?;
    let application = state
        .applications
        .find_by_id(&id)
        .ok_or(ApplicationError::NotFound)?;

    Ok(Json(json!({
        "success": true,
        "application": PublicApplication::from(&application),
    })))
}
