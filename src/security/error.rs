//! Guard rejection taxonomy and its wire format.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Which header an origin rejection was based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginHeader {
    Origin,
    Referer,
}

impl std::fmt::Display for OriginHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginHeader::Origin => write!(f, "origin"),
            OriginHeader::Referer => write!(f, "referer"),
        }
    }
}

/// Terminal, client-facing rejection produced by a guard.
///
/// None of these indicate a server fault. A missing server-side API key is
/// reported as [`GuardError::InvalidCredential`] so that the guard fails closed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// The API-key header was not sent.
    #[error("missing API key")]
    MissingCredential,

    /// The API key did not match, or none is configured.
    #[error("invalid API key")]
    InvalidCredential,

    /// `Origin` or `Referer` is not on the allow-list.
    #[error("forbidden {0}")]
    ForbiddenOrigin(OriginHeader),

    /// A honeypot field was filled in.
    #[error("honeypot field {field:?} filled")]
    BotSuspected { field: String },

    /// Too many requests in the trailing window.
    #[error("rate limited, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },
}

impl GuardError {
    pub fn status(&self) -> StatusCode {
        match self {
            GuardError::MissingCredential | GuardError::InvalidCredential => StatusCode::UNAUTHORIZED,
            GuardError::ForbiddenOrigin(_) => StatusCode::FORBIDDEN,
            GuardError::BotSuspected { .. } => StatusCode::BAD_REQUEST,
            GuardError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Value of the `error` field in the response body.
    pub fn label(&self) -> &'static str {
        match self {
            GuardError::MissingCredential => "API key required",
            GuardError::InvalidCredential => "Invalid API key",
            GuardError::ForbiddenOrigin(OriginHeader::Origin) => "Unauthorized origin",
            GuardError::ForbiddenOrigin(OriginHeader::Referer) => "Unauthorized referer",
            GuardError::BotSuspected { .. } => "Invalid submission",
            GuardError::RateLimited { .. } => "Rate limit exceeded",
        }
    }

    /// Value of the `message` field in the response body.
    pub fn message(&self) -> &'static str {
        match self {
            GuardError::MissingCredential => "Please provide X-API-Key header",
            GuardError::InvalidCredential => "Unauthorized access",
            GuardError::ForbiddenOrigin(_) => "Request not allowed from this domain",
            GuardError::BotSuspected { .. } => "Please try again",
            GuardError::RateLimited { .. } => "Too many requests, please try again later",
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            GuardError::RateLimited { retry_after } => {
                let body = json!({
                    "error": self.label(),
                    "message": self.message(),
                    "retry_after": retry_after,
                });
                let mut response = (status, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
                response
            }
            // The honeypot field name stays in the logs, not in the body.
            _ => {
                let body = json!({
                    "error": self.label(),
                    "message": self.message(),
                });
                (status, Json(body)).into_response()
            }
        }
    }
}
