//! Ordered composition of guards around one protected operation.
//!
//! # Data Flow
//! ```text
//! request ─▶ guard[0] ─▶ guard[1] ─▶ … ─▶ protected operation
//!                                              │
//! response ◀─ guard[0] ◀─ guard[1] ◀─ … ◀──────┘   (on_response, innermost first)
//!
//! rejection at guard[i]:
//!     error response ─▶ on_response of guard[i-1] … guard[0]
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};

use crate::config::{GuardKind, GuardSettings, RouteGuardConfig};
use crate::observability::metrics;
use crate::security::api_key::ApiKeyGuard;
use crate::security::guard::{Guard, RequestContext};
use crate::security::headers::SecurityHeadersGuard;
use crate::security::honeypot::HoneypotGuard;
use crate::security::origin::OriginGuard;
use crate::security::rate_limit::{RateLimitGuard, RateLimitPolicy, RateLimiter};

/// Guards wrapping one protected operation, outermost first.
#[derive(Debug, Clone)]
pub struct GuardChain {
    operation: String,
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Guard names in application order.
    pub fn guard_names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Whether any guard needs the parsed request body.
    pub fn needs_body(&self) -> bool {
        self.guards.iter().any(|g| g.needs_body())
    }

    /// Run the guards and, if all admit the request, the protected operation.
    pub async fn run<F, Fut>(&self, ctx: &RequestContext, protected: F) -> Response
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Response>,
    {
        for (depth, guard) in self.guards.iter().enumerate() {
            if let Err(rejection) = guard.inspect(ctx) {
                tracing::warn!(
                    guard = guard.name(),
                    operation = %self.operation,
                    client = %ctx.client_id(),
                    peer = ?ctx.peer,
                    reason = %rejection,
                    "Request rejected"
                );
                metrics::record_rejection(guard.name(), &self.operation);

                let mut response = rejection.into_response();
                unwind(&self.guards[..depth], &mut response);
                return response;
            }
        }

        metrics::record_admission(&self.operation);
        let mut response = protected().await;
        unwind(&self.guards, &mut response);
        response
    }

    /// Post-process a response produced before any guard inspected the request.
    pub fn seal(&self, mut response: Response) -> Response {
        unwind(&self.guards, &mut response);
        response
    }
}

fn unwind(admitted: &[Arc<dyn Guard>], response: &mut Response) {
    for guard in admitted.iter().rev() {
        guard.on_response(response);
    }
}

/// Builds a [`GuardChain`] in explicit order.
///
/// The security-header guard is always placed outermost, whatever the call order.
#[derive(Debug)]
pub struct ChainBuilder {
    operation: String,
    guards: Vec<Arc<dyn Guard>>,
    security_headers: bool,
}

impl ChainBuilder {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            guards: Vec::new(),
            security_headers: false,
        }
    }

    pub fn security_headers(mut self) -> Self {
        self.security_headers = true;
        self
    }

    pub fn rate_limit(self, limiter: &Arc<RateLimiter>, policy: RateLimitPolicy) -> Self {
        let guard = RateLimitGuard::new(Arc::clone(limiter), self.operation.clone(), policy);
        self.guard(guard)
    }

    pub fn origin<I, S>(self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.guard(OriginGuard::new(allowed))
    }

    pub fn honeypot<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guard(HoneypotGuard::new(fields))
    }

    pub fn api_key(self, expected: Option<String>) -> Self {
        self.guard(ApiKeyGuard::new(expected))
    }

    /// Append any guard as the next inner layer.
    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Materialize a route's configured guard list, in its declared order.
    pub fn from_config(
        operation: impl Into<String>,
        route: &RouteGuardConfig,
        settings: &GuardSettings,
        limiter: &Arc<RateLimiter>,
    ) -> Self {
        let mut builder = Self::new(operation);
        for kind in &route.guards {
            builder = match kind {
                GuardKind::SecurityHeaders => builder.security_headers(),
                GuardKind::RateLimit => builder.rate_limit(
                    limiter,
                    RateLimitPolicy::new(route.max_requests, route.window()),
                ),
                GuardKind::Origin => builder.origin(&settings.allowed_origins),
                GuardKind::Honeypot => builder.honeypot(settings.honeypot_fields.iter().cloned()),
                GuardKind::ApiKey => builder.api_key(settings.api_key.clone()),
            };
        }
        builder
    }

    pub fn build(self) -> GuardChain {
        let mut guards = self.guards;
        if self.security_headers {
            guards.insert(0, Arc::new(SecurityHeadersGuard));
        }
        GuardChain {
            operation: self.operation,
            guards,
        }
    }
}
