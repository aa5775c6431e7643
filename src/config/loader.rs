//! Configuration loading from disk and environment.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatekeeperConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `gatekeeper.api_key`.
pub const API_KEY_ENV: &str = "API_KEY";

/// Environment variable overriding `gatekeeper.allowed_origins` (comma separated).
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatekeeperConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatekeeperConfig = toml::from_str(&content)?;
    finalize(config, |name| std::env::var(name).ok())
}

/// Load and validate the built-in defaults (no file given).
pub fn load_default() -> Result<GatekeeperConfig, ConfigError> {
    finalize(GatekeeperConfig::default(), |name| std::env::var(name).ok())
}

/// Apply overrides, normalize and validate.
fn finalize<F>(mut config: GatekeeperConfig, env: F) -> Result<GatekeeperConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, env);
    normalize(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay deployment secrets and origins from the environment.
pub fn apply_env_overrides<F>(config: &mut GatekeeperConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = env(API_KEY_ENV).filter(|k| !k.is_empty()) {
        config.gatekeeper.api_key = Some(key);
    }

    if let Some(origins) = env(ALLOWED_ORIGINS_ENV) {
        config.gatekeeper.allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
}

/// Normalize values whose raw form would change guard semantics.
pub fn normalize(config: &mut GatekeeperConfig) {
    for origin in &mut config.gatekeeper.allowed_origins {
        *origin = normalize_origin(origin);
    }
    let mut seen = HashSet::new();
    config
        .gatekeeper
        .allowed_origins
        .retain(|origin| seen.insert(origin.clone()));

    if config.gatekeeper.api_key.as_deref() == Some("") {
        config.gatekeeper.api_key = None;
    }
}

/// Strip whitespace and trailing slashes from an allowed origin.
pub fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_string()
}
