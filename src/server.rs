use axum::{
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::Method,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use bytes::Bytes;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::RelayError;
use crate::models::RelayRequest;
use crate::relay::ChatRelay;
use crate::util::cors_layer_from_env;

/// Path of the relay endpoint.
pub const CHAT_PATH: &str = "/api/chat";

/// Build the Axum router with `/status` and `/api/chat`.
pub fn build_router(relay: ChatRelay) -> Router {
    let body_limit = relay.config().max_body_bytes;
    let state = Arc::new(relay);

    Router::new()
        .route("/status", get(status))
        // Every method is routed here so non-POST calls get the JSON 405 body.
        .route(
            CHAT_PATH,
            any(chat).layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer_from_env())
}

/// Service status endpoint exposing the provider target and whether a key is configured.
async fn status(State(relay): State<Arc<ChatRelay>>) -> impl IntoResponse {
    let config = relay.config();
    Json(serde_json::json!({
        "name": "chat-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": ["/status", CHAT_PATH],
        "provider": {
            "base_url": config.base_url,
            "model": config.model,
        },
        "configured": config.api_key().is_some(),
    }))
}

/// Relay a chat message to the provider.
/// - POST only; other methods get 405 without any outbound call
/// - Body must be `{ "message": "...", "history": [...] }`
async fn chat(
    State(relay): State<Arc<ChatRelay>>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if method != Method::POST {
        tracing::debug!(method = %method, "rejecting non-POST chat request");
        return RelayError::MethodNotAllowed.into_response();
    }

    // Oversized or unreadable bodies get the JSON error shape, not axum's plain-text rejection.
    let body = match body {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, status = %e.status(), "failed to read chat request body");
            return RelayError::InternalError.into_response();
        }
    };

    let req: RelayRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "failed to parse chat request body");
            return RelayError::InternalError.into_response();
        }
    };

    match relay.relay(req).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => e.into_response(),
    }
}
