//! The guard capability and the per-request view guards inspect.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    http::{HeaderMap, Method},
    response::Response,
};
use serde_json::{Map, Value};

use crate::security::client::client_identifier;
use crate::security::error::GuardError;

/// A composable request interceptor.
///
/// `inspect` either lets the request through or rejects it with a terminal
/// [`GuardError`]. Guards that also touch the outgoing response override
/// `on_response`, which the chain calls for every guard that admitted the request.
pub trait Guard: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn inspect(&self, ctx: &RequestContext) -> Result<(), GuardError>;

    fn on_response(&self, _response: &mut Response) {}

    /// Whether the request body must be buffered and parsed before `inspect`.
    fn needs_body(&self) -> bool {
        false
    }
}

/// Read-only snapshot of an incoming request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Direct connection address, when the transport provides one.
    pub peer: Option<SocketAddr>,
    /// Top-level fields of a JSON object body; empty otherwise.
    pub body: Map<String, Value>,
    /// Instant the request entered the chain; the rate limiter's `now`.
    pub received_at: Instant,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, peer: Option<SocketAddr>) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            peer,
            body: Map::new(),
            received_at: Instant::now(),
        }
    }

    /// Attach a raw body. Anything that is not a JSON object leaves the map empty.
    pub fn with_body(mut self, bytes: &[u8]) -> Self {
        self.body = match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        self
    }

    pub fn at(mut self, instant: Instant) -> Self {
        self.received_at = instant;
        self
    }

    /// Identity used to key rate-limit windows.
    pub fn client_id(&self) -> String {
        client_identifier(&self.headers, self.peer)
    }
}
