//! Security response headers.
//!
//! # Responsibilities
//! - Prevent MIME sniffing, frame embedding and response caching
//! - Apply to every response, including rejections from inner guards
//!
//! # Design Decisions
//! - Never rejects; only post-processes
//! - Always the outermost guard of a chain (enforced by the chain builder)
//! - Overwrites any value the handler set for the same header

use axum::{
    http::{header, HeaderName, HeaderValue},
    response::Response,
};

use crate::security::error::GuardError;
use crate::security::guard::{Guard, RequestContext};

/// The fixed header set written to every response.
pub const SECURITY_HEADERS: [(HeaderName, &str); 4] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::X_XSS_PROTECTION, "1; mode=block"),
    (header::CACHE_CONTROL, "no-store, no-cache, must-revalidate, max-age=0"),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityHeadersGuard;

impl Guard for SecurityHeadersGuard {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn inspect(&self, _ctx: &RequestContext) -> Result<(), GuardError> {
        Ok(())
    }

    fn on_response(&self, response: &mut Response) {
        let headers = response.headers_mut();
        for (name, value) in SECURITY_HEADERS {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }
}
