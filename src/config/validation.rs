//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, rate-limit windows within (0, one year])
//! - Check allowed origins are bare origins (scheme, host, port)
//! - Detect guards listed twice on one route
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatekeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{GatekeeperConfig, GuardKind};

/// Longest accepted rate-limit window: one year.
pub const MAX_WINDOW_MINUTES: u64 = 60 * 24 * 365;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("server.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("allowed origin {origin:?} is invalid: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("route {route:?}: max_requests must be greater than zero")]
    ZeroMaxRequests { route: String },

    #[error("route {route:?}: window_minutes must be greater than zero")]
    ZeroWindow { route: String },

    #[error("route {route:?}: window_minutes must be at most {MAX_WINDOW_MINUTES}")]
    WindowTooLarge { route: String },

    #[error("route {route:?}: guard {guard} listed more than once")]
    DuplicateGuard { route: String, guard: &'static str },
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    for origin in &config.gatekeeper.allowed_origins {
        if let Err(reason) = check_origin(origin) {
            errors.push(ValidationError::InvalidOrigin {
                origin: origin.clone(),
                reason,
            });
        }
    }

    for (name, route) in &config.routes {
        let mut seen = HashSet::new();
        for guard in &route.guards {
            if !seen.insert(*guard) {
                errors.push(ValidationError::DuplicateGuard {
                    route: name.clone(),
                    guard: guard.as_str(),
                });
            }
        }

        if route.uses(GuardKind::RateLimit) {
            if route.max_requests == 0 {
                errors.push(ValidationError::ZeroMaxRequests { route: name.clone() });
            }
            if route.window_minutes == 0 {
                errors.push(ValidationError::ZeroWindow { route: name.clone() });
            }
            if route.window_minutes > MAX_WINDOW_MINUTES {
                errors.push(ValidationError::WindowTooLarge { route: name.clone() });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An allowed origin must be exactly `scheme://host[:port]`, otherwise the
/// referer prefix check stops meaning "same origin".
fn check_origin(origin: &str) -> Result<(), String> {
    let url = Url::parse(origin).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme {}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err("origins cannot carry a path, query or fragment".to_string());
    }
    if origin.ends_with('/') {
        return Err("trailing slash".to_string());
    }
    Ok(())
}
