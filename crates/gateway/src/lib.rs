//! HTTP gateway for interactive callbacks.
//!
//! Exposes the webhook endpoint the chat platform calls when a user clicks
//! a button or picks from a menu, plus a health check. Every request is
//! authenticated by its signature before the body is parsed.
//!
//! Built on Axum.

pub mod payload;
pub mod signature;

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use corvid_routers::{CallbackReply, CallbackRouter};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::signature::SignatureVerifier;

/// Shared state for the gateway.
pub struct AppState {
    pub callbacks: Arc<CallbackRouter>,
    pub verifier: SignatureVerifier,
}

type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack/message_handler", post(callback_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn serve(addr: &str, state: SharedState) -> std::io::Result<()> {
    let app = build_router(state);
    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Receives interactive callbacks, verifies their signature over the raw
/// body, and answers with the engine's reply as the HTTP response.
async fn callback_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallbackReply>, StatusCode> {
    let timestamp = header_str(&headers, "X-Slack-Request-Timestamp");
    let sig = header_str(&headers, "X-Slack-Signature");
    if !state.verifier.verify(timestamp, &body, sig) {
        warn!("Callback rejected: bad signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let event = match payload::parse_event(&body) {
        Ok(event) => event,
        Err(reason) => {
            warn!(reason = %reason, "Callback rejected: unparseable payload");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    match state.callbacks.handle(&event).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            error!(key = %event.key, error = %e, "Callback handling failed");
            Ok(Json(CallbackReply {
                text: "Something went wrong, please try again later".to_string(),
                attachments: Vec::new(),
                replace_original: false,
                response_type: "in_channel".to_string(),
            }))
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use corvid_core::module::ModuleRegistry;
    use corvid_core::store::SessionStore;
    use corvid_engine::DialogEngine;
    use corvid_routers::KeyLocks;
    use corvid_store::MemoryStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "signing-secret";

    const RULES_DOC: &str = r#"{
        "rules": [
            {
                "terms": ["order"],
                "interaction_start": "size",
                "interactions": [
                    {
                        "interaction_id": "size",
                        "stop_word": "stop",
                        "type": "attachment",
                        "question": "What size?",
                        "next_interaction": "end",
                        "attachment": {"callback_id": "size", "text": "What size?", "fallback": "What size?"}
                    }
                ]
            }
        ],
        "default": "dunno"
    }"#;

    async fn test_state() -> SharedState {
        let catalog = Arc::new(corvid_rules::parse(RULES_DOC).unwrap());
        let store = Arc::new(MemoryStore::new());
        store
            .set_fields(
                "T1:D1",
                &[
                    ("interaction".to_string(), "size".to_string()),
                    ("stop_word".to_string(), "stop".to_string()),
                    ("userid".to_string(), "U123".to_string()),
                    ("username".to_string(), "Alice".to_string()),
                    ("type".to_string(), "attachment".to_string()),
                    ("next_interaction".to_string(), "end".to_string()),
                ],
                Some(std::time::Duration::from_secs(60)),
            )
            .await
            .unwrap();
        let callbacks = Arc::new(CallbackRouter::new(
            Arc::new(DialogEngine::new(catalog)),
            store,
            Arc::new(ModuleRegistry::new()),
            Arc::new(KeyLocks::new()),
        ));
        Arc::new(AppState {
            callbacks,
            verifier: SignatureVerifier::new(SECRET),
        })
    }

    fn callback_body() -> Vec<u8> {
        let payload = r#"{
            "callback_id": "size",
            "team": {"id": "T1"},
            "channel": {"id": "D1"},
            "actions": [{"type": "button", "value": "large"}]
        }"#;
        serde_urlencoded::to_string([("payload", payload)])
            .unwrap()
            .into_bytes()
    }

    fn signed_request(secret: &str, body: Vec<u8>) -> Request<Body> {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs()
            .to_string();
        let sig = crate::signature::sign(secret, &ts, &body);
        Request::builder()
            .method("POST")
            .uri("/slack/message_handler")
            .header("X-Slack-Request-Timestamp", ts)
            .header("X-Slack-Signature", sig)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state().await);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn valid_callback_completes_dialog() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(signed_request(SECRET, callback_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["text"],
            "You selected: large\nThanks! We'll get back to you soon"
        );
        assert_eq!(json["replace_original"], true);
        assert_eq!(json["response_type"], "in_channel");
    }

    #[tokio::test]
    async fn bad_signature_unauthorized() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(signed_request("wrong-secret", callback_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_payload_bad_request() {
        let app = build_router(test_state().await);
        let response = app
            .oneshot(signed_request(SECRET, b"payload=notjson".to_vec()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
