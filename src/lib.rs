//! Request gatekeeper library.
//!
//! Composable request guards (API key, origin allow-list, honeypot, security
//! headers, sliding-window rate limiting) in front of axum routes.

pub mod applications;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatekeeperConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
