//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or built-in defaults
//!     → loader.rs (parse, environment overrides, origin normalization)
//!     → validation.rs (semantic checks)
//!     → GatekeeperConfig (validated, immutable)
//!     → guard chains built once at route registration
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; guard chains never observe changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_default, ConfigError};
pub use schema::{
    GatekeeperConfig, GuardKind, GuardSettings, ObservabilityConfig, RouteGuardConfig,
    ServerConfig, LOOKUP_APPLICATION, SUBMIT_APPLICATION,
};
