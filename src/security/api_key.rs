//! Shared-secret API key check.

use crate::security::error::GuardError;
use crate::security::guard::{Guard, RequestContext};

/// Header carrying the shared secret.
pub const X_API_KEY: &str = "x-api-key";

/// Rejects requests whose `X-API-Key` does not exactly match the configured secret.
///
/// An empty header counts as absent. With no secret configured every request is rejected.
pub struct ApiKeyGuard {
    expected: Option<String>,
}

impl ApiKeyGuard {
    pub fn new(expected: Option<String>) -> Self {
        let expected = expected.filter(|k| !k.is_empty());
        if expected.is_none() {
            tracing::warn!("No API key configured; API-key protected routes will reject all requests");
        }
        Self { expected }
    }
}

// Keep the secret out of Debug output.
impl std::fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("configured", &self.expected.is_some())
            .finish()
    }
}

impl Guard for ApiKeyGuard {
    fn name(&self) -> &'static str {
        "api_key"
    }

    fn inspect(&self, ctx: &RequestContext) -> Result<(), GuardError> {
        let Some(provided) = ctx.headers.get(X_API_KEY).filter(|v| !v.is_empty()) else {
            return Err(GuardError::MissingCredential);
        };

        match &self.expected {
            Some(expected) if provided.as_bytes() == expected.as_bytes() => Ok(()),
            Some(_) => Err(GuardError::InvalidCredential),
            None => {
                tracing::warn!(
                    path = %ctx.path,
                    "API key presented but none is configured server-side; failing closed"
                );
                Err(GuardError::InvalidCredential)
            }
        }
    }
}
