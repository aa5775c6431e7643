//! Security subsystem: request gatekeeping.
//!
//! # Data Flow
//! ```text
//! Incoming request (per protected route):
//!     → headers.rs (outermost; post-processes every response)
//!     → rate_limit.rs (per client + operation sliding window)
//!     → origin.rs (Origin / Referer allow-list)
//!     → honeypot.rs (decoy body fields)
//!     → api_key.rs (shared secret)
//!     → protected handler
//! ```
//! The order above is the default for application submission; each route
//! declares its own ordered list and chain.rs composes it.
//!
//! # Design Decisions
//! - Defense in depth: multiple independent guards
//! - Fail closed: a missing API key configuration rejects everything
//! - Rejections are terminal and never counted by the rate limiter

pub mod api_key;
pub mod chain;
pub mod client;
pub mod error;
pub mod guard;
pub mod headers;
pub mod honeypot;
pub mod origin;
pub mod rate_limit;

pub use chain::{ChainBuilder, GuardChain};
pub use error::GuardError;
pub use guard::{Guard, RequestContext};
pub use rate_limit::{RateLimitKey, RateLimitPolicy, RateLimiter};
