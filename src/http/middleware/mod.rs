//! Axum middleware.

pub mod guard;

pub use guard::enforce;
