//! Career applications: the operations the gatekeeper protects.
//!
//! # Responsibilities
//! - Validate submitted applications
//! - Store them behind [`ApplicationRepository`] (storage is an external collaborator)
//! - Expose only public fields on lookup

pub mod repository;
pub mod validation;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub use repository::{ApplicationRepository, InMemoryApplications};
pub use validation::validate_submission;

/// Raw submission body. Everything is optional so that validation can report
/// which field is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationSubmission {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub contact_number: Option<String>,
    pub total_experience: Option<u32>,
    pub ts_experience: Option<u32>,
    pub react_experience: Option<u32>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub cover_note: Option<String>,
}

/// Review state. Submissions always start out pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
}

/// A stored application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Application {
    pub application_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub contact_number: String,
    pub total_experience: Option<u32>,
    pub ts_experience: Option<u32>,
    pub react_experience: Option<u32>,
    pub portfolio_url: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub cover_note: Option<String>,
    pub status: ApplicationStatus,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

/// Fields returned by the public lookup.
#[derive(Debug, Clone, Serialize)]
pub struct PublicApplication {
    pub application_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub status: ApplicationStatus,
    pub created_at: u64,
}

impl From<&Application> for PublicApplication {
    fn from(app: &Application) -> Self {
        Self {
            application_id: app.application_id,
            full_name: app.full_name.clone(),
            email: app.email.clone(),
            status: app.status,
            created_at: app.created_at,
        }
    }
}

/// Handler-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    #[error("{0}")]
    Invalid(String),

    #[error("An application with this email already exists")]
    Duplicate { application_id: Uuid },

    #[error("Application not found")]
    NotFound,
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        match &self {
            ApplicationError::Invalid(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": self.to_string() }))).into_response()
            }
            ApplicationError::Duplicate { application_id } => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": self.to_string(),
                    "application_id": application_id,
                })),
            )
                .into_response(),
            ApplicationError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": self.to_string() }))).into_response()
            }
        }
    }
}
