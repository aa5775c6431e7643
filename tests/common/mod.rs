//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use request_gatekeeper::{GatekeeperConfig, HttpServer, Shutdown};
use tokio::net::TcpListener;

pub const API_KEY: &str = "abc123";
pub const ORIGIN: &str = "https://example.com";

/// A configuration with a known API key and a single allowed origin.
pub fn test_config() -> GatekeeperConfig {
    let mut config = GatekeeperConfig::default();
    config.gatekeeper.api_key = Some(API_KEY.to_string());
    config.gatekeeper.allowed_origins = vec![ORIGIN.to_string()];
    config.gatekeeper.sweep_interval_secs = 1;
    config
}

/// Start the gatekeeper on an ephemeral port.
pub async fn start_gatekeeper(config: GatekeeperConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    wait_until_ready(addr).await;
    (addr, shutdown)
}

async fn wait_until_ready(addr: SocketAddr) {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("gatekeeper did not start on {addr}");
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn applicant(email: &str) -> serde_json::Value {
    serde_json::json!({
        "full_name": "Ada Lovelace",
        "email": email,
        "contact_number": "+44 20 7946 0958",
    })
}
