//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Operation name of the career application submission route.
pub const SUBMIT_APPLICATION: &str = "submit_application";

/// Operation name of the career application lookup route.
pub const LOOKUP_APPLICATION: &str = "lookup_application";

/// Root configuration for the gatekeeper service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener and request-level limits.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Settings shared by every guard chain.
    pub gatekeeper: GuardSettings,

    /// Per-operation guard chains, keyed by operation name.
    pub routes: BTreeMap<String, RouteGuardConfig>,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        let mut routes = BTreeMap::new();
        routes.insert(
            SUBMIT_APPLICATION.to_string(),
            RouteGuardConfig {
                guards: vec![
                    GuardKind::SecurityHeaders,
                    GuardKind::RateLimit,
                    GuardKind::Origin,
                    GuardKind::Honeypot,
                    GuardKind::ApiKey,
                ],
                max_requests: 3,
                window_minutes: 60,
            },
        );
        routes.insert(
            LOOKUP_APPLICATION.to_string(),
            RouteGuardConfig {
                guards: vec![GuardKind::SecurityHeaders, GuardKind::RateLimit],
                max_requests: 10,
                window_minutes: 15,
            },
        );

        Self {
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            gatekeeper: GuardSettings::default(),
            routes,
        }
    }
}

impl GatekeeperConfig {
    /// Guard chain configuration for an operation, if one is declared.
    pub fn route(&self, operation: &str) -> Option<&RouteGuardConfig> {
        self.routes.get(operation)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Settings consumed by the individual guards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardSettings {
    /// Shared secret expected in the `X-API-Key` header.
    /// When absent the API-key guard rejects every request.
    pub api_key: Option<String>,

    /// Exact origins allowed to call guarded routes (no wildcards).
    pub allowed_origins: Vec<String>,

    /// Body fields that humans never fill in.
    pub honeypot_fields: Vec<String>,

    /// Interval between idle rate-limit key sweeps in seconds (0 = disabled).
    pub sweep_interval_secs: u64,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://solve-ease.vercel.app".to_string(),
            ],
            honeypot_fields: ["website", "url", "homepage", "bot_field", "honeypot"]
                .into_iter()
                .map(String::from)
                .collect(),
            sweep_interval_secs: 300,
        }
    }
}

impl GuardSettings {
    /// Sweep interval, or `None` when sweeping is disabled.
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }
}

/// A guard that can appear in a route's chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardKind {
    SecurityHeaders,
    RateLimit,
    Origin,
    Honeypot,
    ApiKey,
}

impl GuardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GuardKind::SecurityHeaders => "security_headers",
            GuardKind::RateLimit => "rate_limit",
            GuardKind::Origin => "origin",
            GuardKind::Honeypot => "honeypot",
            GuardKind::ApiKey => "api_key",
        }
    }
}

/// Guard chain for one protected operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteGuardConfig {
    /// Guards in application order, outermost first.
    pub guards: Vec<GuardKind>,

    /// Requests admitted per window (only used with `rate_limit`).
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in minutes (only used with `rate_limit`).
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_minutes() -> u64 {
    15
}

impl RouteGuardConfig {
    /// Trailing window length.
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_minutes.saturating_mul(60))
    }

    pub fn uses(&self, kind: GuardKind) -> bool {
        self.guards.contains(&kind)
    }
}
