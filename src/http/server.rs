//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Build one guard chain per protected operation from configuration
//! - Wire up global middleware (tracing, timeout, body limit, request ID)
//! - Own the shared rate-limit table and its sweeper
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::applications::{ApplicationRepository, InMemoryApplications};
use crate::config::{GatekeeperConfig, LOOKUP_APPLICATION, SUBMIT_APPLICATION};
use crate::http::handlers::{health, lookup_application, submit_application};
use crate::http::middleware::{enforce, guard::GuardState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::{shutdown, Shutdown};
use crate::security::{ChainBuilder, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub applications: Arc<dyn ApplicationRepository>,
}

/// HTTP server for the gatekeeper.
pub struct HttpServer {
    router: Router,
    config: GatekeeperConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server backed by in-memory storage.
    pub fn new(config: GatekeeperConfig) -> Self {
        Self::with_repository(config, Arc::new(InMemoryApplications::new()))
    }

    pub fn with_repository(config: GatekeeperConfig, applications: Arc<dyn ApplicationRepository>) -> Self {
        let limiter = Arc::new(RateLimiter::new());
        let state = AppState { applications };
        let router = Self::build_router(&config, state, &limiter);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatekeeperConfig, state: AppState, limiter: &Arc<RateLimiter>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route(
                "/api/apply",
                protect(post(submit_application), config, SUBMIT_APPLICATION, limiter),
            )
            .route(
                "/api/apply/{application_id}",
                protect(get(lookup_application), config, LOOKUP_APPLICATION, limiter),
            )
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
            .layer(RequestBodyLimitLayer::new(config.server.max_body_size))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The shared rate-limit table.
    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(interval) = self.config.gatekeeper.sweep_interval() {
            self.limiter.spawn_sweeper(interval, shutdown.subscribe());
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown.subscribe()))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }
}

/// Wrap a route in the guard chain configured for `operation`, if any.
fn protect(
    route: MethodRouter<AppState>,
    config: &GatekeeperConfig,
    operation: &str,
    limiter: &Arc<RateLimiter>,
) -> MethodRouter<AppState> {
    let Some(route_config) = config.route(operation) else {
        tracing::warn!(operation = %operation, "No guard chain configured; route is unprotected");
        return route;
    };

    let chain = ChainBuilder::from_config(operation, route_config, &config.gatekeeper, limiter).build();
    tracing::info!(operation = %operation, guards = ?chain.guard_names(), "Guard chain registered");

    let state = GuardState {
        chain: Arc::new(chain),
        max_body_size: config.server.max_body_size,
    };
    route.route_layer(middleware::from_fn_with_state(state, enforce))
}
