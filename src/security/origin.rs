//! Origin / Referer allow-list.
//!
//! # Design Decisions
//! - `Origin` must equal an allow-list entry exactly (no suffix or substring match)
//! - `Referer` must start with an allow-list entry
//! - Requests carrying neither header pass, so non-browser clients keep working.
//!   This is a relaxation, not a security boundary.
//! - An empty header counts as absent; a present value that is not UTF-8 can
//!   never match and is rejected.

use axum::http::{header, HeaderName};

use crate::config::loader::normalize_origin;
use crate::security::error::{GuardError, OriginHeader};
use crate::security::guard::{Guard, RequestContext};

#[derive(Debug, Clone)]
pub struct OriginGuard {
    allowed: Vec<String>,
}

impl OriginGuard {
    /// Entries are normalized so the referer prefix check matches exact-origin semantics.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|o| normalize_origin(o.as_ref()))
            .filter(|o| !o.is_empty())
            .collect();
        Self { allowed }
    }

    fn origin_allowed(&self, origin: &[u8]) -> bool {
        self.allowed.iter().any(|a| a.as_bytes() == origin)
    }

    fn referer_allowed(&self, referer: &[u8]) -> bool {
        self.allowed.iter().any(|a| referer.starts_with(a.as_bytes()))
    }
}

/// Raw header bytes, with an empty value treated as absent.
fn present<'a>(ctx: &'a RequestContext, name: &HeaderName) -> Option<&'a [u8]> {
    ctx.headers
        .get(name)
        .map(|v| v.as_bytes())
        .filter(|v| !v.is_empty())
}

impl Guard for OriginGuard {
    fn name(&self) -> &'static str {
        "origin"
    }

    fn inspect(&self, ctx: &RequestContext) -> Result<(), GuardError> {
        if let Some(origin) = present(ctx, &header::ORIGIN) {
            if !self.origin_allowed(origin) {
                tracing::debug!(origin = %String::from_utf8_lossy(origin), "Origin not on allow-list");
                return Err(GuardError::ForbiddenOrigin(OriginHeader::Origin));
            }
        }

        if let Some(referer) = present(ctx, &header::REFERER) {
            if !self.referer_allowed(referer) {
                tracing::debug!(referer = %String::from_utf8_lossy(referer), "Referer not on allow-list");
                return Err(GuardError::ForbiddenOrigin(OriginHeader::Referer));
            }
        }

        Ok(())
    }
}
