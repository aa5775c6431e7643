//! Request gatekeeper service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout / body limit
//!                                                  │
//!                                                  ▼
//!                         ┌──────────── guard chain (per route) ────────────┐
//!                         │ security headers ▶ rate limit ▶ origin ▶        │
//!                         │ honeypot ▶ api key ▶ handler                    │
//!                         └─────────────────────────────────────────────────┘
//!                                                  │
//!     Client Response                              ▼
//!     ◀────────────── security headers added on the way out (even on rejection)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_gatekeeper::config::{self, GatekeeperConfig};
use request_gatekeeper::lifecycle::{signals, Shutdown};
use request_gatekeeper::observability::{logging, metrics};
use request_gatekeeper::HttpServer;

#[derive(Parser)]
#[command(name = "request-gatekeeper")]
#[command(about = "HTTP service with composable request guards", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "GATEKEEPER_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config: GatekeeperConfig = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_default()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("request-gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.server.bind_address,
        routes = config.routes.len(),
        allowed_origins = config.gatekeeper.allowed_origins.len(),
        api_key_configured = config.gatekeeper.api_key.is_some(),
        "Configuration loaded"
    );

    if cli.check {
        tracing::info!("Configuration is valid");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
