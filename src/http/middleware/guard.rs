//! Runs a [`GuardChain`] in front of a route handler.
//!
//! Attach with `route_layer(from_fn_with_state(Arc<GuardChain>, enforce))`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::request::request_id;
use crate::security::{GuardChain, RequestContext};

/// Body limit applied when a chain buffers the request body.
#[derive(Debug, Clone)]
pub struct GuardState {
    pub chain: Arc<GuardChain>,
    pub max_body_size: usize,
}

pub async fn enforce(State(state): State<GuardState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        request_id = request_id(&request).unwrap_or("unknown"),
        operation = %state.chain.operation(),
        "Running guard chain"
    );

    let mut ctx = RequestContext::new(
        request.method().clone(),
        request.uri().path(),
        request.headers().clone(),
        peer,
    );

    let request = if state.chain.needs_body() {
        let (parts, body) = request.into_parts();
        let bytes = match to_bytes(body, state.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, operation = %state.chain.operation(), "Request body rejected");
                let response = (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(json!({
                        "error": "Payload too large",
                        "message": "Request body exceeds the allowed size",
                    })),
                )
                    .into_response();
                return state.chain.seal(response);
            }
        };
        ctx = ctx.with_body(&bytes);
        Request::from_parts(parts, Body::from(bytes))
    } else {
        request
    };

    state.chain.run(&ctx, move || next.run(request)).await
}
