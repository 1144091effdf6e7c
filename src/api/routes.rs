//! HTTP endpoints for the honeypot.
//!
//! Every response is a 200 with a JSON body. Bodies are read as raw bytes so
//! empty, non-JSON, or oddly shaped payloads still produce a turn.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::pipeline::types::{Intelligence, TurnResult, coerce_message};
use crate::pipeline::TurnProcessor;

/// Conversation id used when the caller sends none.
pub const DEFAULT_CONVERSATION_ID: &str = "tester_default";

/// Message used when the caller sends none.
pub const DEFAULT_MESSAGE: &str = "Hello";

/// Header carrying the caller's key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<TurnProcessor>,
    pub auth: AuthConfig,
}

/// Build the Axum router with all honeypot routes.
///
/// The body limit is off: an oversized message is still a turn.
pub fn honeypot_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(
            "/honeypot",
            get(tester_probe).post(tester_probe).options(tester_probe),
        )
        .route("/honeypot/agent", post(agent_turn))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Probes ──────────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(json!({ "status": "honeypot api is running" }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let conversations = match state.processor.conversation_count().await {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(error = %e, "Health check could not count conversations");
            None
        }
    };
    Json(json!({
        "status": "ok",
        "service": "honeypot",
        "conversations": conversations,
    }))
}

/// Reachability check for testers. Never reads the body.
async fn tester_probe(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(rejection) = check_api_key(&state.auth, &headers) {
        return rejection;
    }

    Json(ProbeResponse {
        status: "ok",
        result: TurnResult {
            scam_detected: false,
            agent_reply: "Service online".to_string(),
            turns: 0,
            extracted_intelligence: Intelligence::default(),
        },
    })
    .into_response()
}

/// Canned probe body: an empty turn result plus a status marker.
#[derive(Debug, Serialize)]
struct ProbeResponse {
    status: &'static str,
    #[serde(flatten)]
    result: TurnResult,
}

// ── Turns ───────────────────────────────────────────────────────────────

async fn agent_turn(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(rejection) = check_api_key(&state.auth, &headers) {
        return rejection;
    }

    let (conversation_id, message) = parse_event(&body);
    let result = state
        .processor
        .process_turn(&conversation_id, &message)
        .await;

    Json(result).into_response()
}

/// Pull `(conversation_id, message)` out of whatever the caller sent.
///
/// - JSON object: read `conversation_id` and `message`, defaulting each
/// - other JSON value: the value is the message
/// - non-JSON text: the text is the message
/// - empty body: both defaults
fn parse_event(body: &[u8]) -> (String, Value) {
    let default_id = || DEFAULT_CONVERSATION_ID.to_string();
    let default_message = || Value::String(DEFAULT_MESSAGE.to_string());

    if body.iter().all(u8::is_ascii_whitespace) {
        return (default_id(), default_message());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut fields)) => {
            let conversation_id = match fields.remove("conversation_id") {
                None | Some(Value::Null) => default_id(),
                Some(id) => coerce_message(&id),
            };
            let message = match fields.remove("message") {
                None | Some(Value::Null) => default_message(),
                Some(message) => message,
            };
            (conversation_id, message)
        }
        Ok(Value::Null) => (default_id(), default_message()),
        Ok(other) => (default_id(), other),
        Err(e) => {
            debug!(error = %e, "Body is not JSON, treating it as message text");
            (
                default_id(),
                Value::String(String::from_utf8_lossy(body).into_owned()),
            )
        }
    }
}

/// `None` to proceed, `Some(response)` to reject. Mismatches are only
/// rejected when enforcement is on.
fn check_api_key(auth: &AuthConfig, headers: &HeaderMap) -> Option<Response> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided == Some(auth.api_key.expose_secret()) {
        return None;
    }

    warn!(
        has_key = provided.is_some(),
        enforced = auth.enforce,
        "Request with missing or invalid API key"
    );

    auth.enforce.then(|| {
        Json(json!({ "status": "error", "message": "Invalid API Key" })).into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::reply::{LlmReplyGenerator, REPLY_TEMPLATES, ReplyPolicy};
    use crate::store::InMemoryStore;

    fn app(enforce: bool) -> Router {
        let processor = Arc::new(TurnProcessor::new(
            Arc::new(InMemoryStore::new()),
            ReplyPolicy::new(Arc::new(LlmReplyGenerator::disabled())),
        ));
        honeypot_routes(AppState {
            processor,
            auth: AuthConfig {
                api_key: SecretString::from("secret"),
                enforce,
            },
        })
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn agent_request(body: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/honeypot/agent")
            .header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[test]
    fn parse_event_reads_object_fields() {
        let (id, message) = parse_event(br#"{"conversation_id": "c9", "message": "otp?"}"#);
        assert_eq!(id, "c9");
        assert_eq!(message, json!("otp?"));
    }

    #[test]
    fn parse_event_defaults_missing_fields() {
        let (id, message) = parse_event(b"{}");
        assert_eq!(id, DEFAULT_CONVERSATION_ID);
        assert_eq!(message, json!(DEFAULT_MESSAGE));

        let (id, message) = parse_event(br#"{"conversation_id": null, "message": null}"#);
        assert_eq!(id, DEFAULT_CONVERSATION_ID);
        assert_eq!(message, json!(DEFAULT_MESSAGE));
    }

    #[test]
    fn parse_event_tolerates_odd_bodies() {
        assert_eq!(
            parse_event(b"   "),
            (DEFAULT_CONVERSATION_ID.to_string(), json!(DEFAULT_MESSAGE))
        );
        assert_eq!(
            parse_event(b"click this link"),
            (DEFAULT_CONVERSATION_ID.to_string(), json!("click this link"))
        );
        assert_eq!(
            parse_event(b"[1, 2]"),
            (DEFAULT_CONVERSATION_ID.to_string(), json!([1, 2]))
        );
    }

    #[test]
    fn parse_event_keeps_structured_message_and_coerces_id() {
        let (id, message) =
            parse_event(br#"{"conversation_id": 7, "message": {"text": "pay now"}}"#);
        assert_eq!(id, "7");
        assert_eq!(message, json!({"text": "pay now"}));
    }

    #[tokio::test]
    async fn root_reports_running() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = call(app(false), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "honeypot api is running");
    }

    #[tokio::test]
    async fn health_counts_conversations() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (_, body) = call(app(false), request).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["conversations"], 0);
    }

    #[tokio::test]
    async fn tester_probe_answers_every_method() {
        for method in ["GET", "POST", "OPTIONS"] {
            let request = Request::builder()
                .method(method)
                .uri("/honeypot")
                .header(API_KEY_HEADER, "secret")
                .body(Body::empty())
                .unwrap();
            let (status, body) = call(app(true), request).await;
            assert_eq!(status, StatusCode::OK, "{method}");
            assert_eq!(body["agent_reply"], "Service online");
            assert_eq!(body["turns"], 0);
            assert_eq!(body["extracted_intelligence"]["otp_codes"], json!([]));
        }
    }

    #[tokio::test]
    async fn agent_turn_returns_turn_result() {
        let request = agent_request(
            r#"{"conversation_id": "c1", "message": "Your bank account is blocked, share OTP"}"#,
            Some("secret"),
        );
        let (status, body) = call(app(true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scam_detected"], true);
        assert_eq!(body["agent_reply"], REPLY_TEMPLATES[0]);
        assert_eq!(body["turns"], 1);
        assert_eq!(body["extracted_intelligence"].as_object().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn agent_turn_renders_only_result_fields() {
        let request = agent_request(r#"{"conversation_id": "a", "message": "otp"}"#, Some("secret"));
        let (_, body) = call(app(false), request).await;

        let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["agent_reply", "extracted_intelligence", "scam_detected", "turns"]
        );
    }

    #[tokio::test]
    async fn oversized_body_still_produces_turn() {
        let message = format!("share otp {}", "a".repeat(3 * 1024 * 1024));
        let body = json!({ "conversation_id": "big", "message": message }).to_string();
        let request = agent_request(&body, Some("secret"));

        let (status, body) = call(app(false), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["turns"], 1);
        assert_eq!(body["scam_detected"], true);
        assert_eq!(body["agent_reply"], REPLY_TEMPLATES[0]);
    }

    #[tokio::test]
    async fn wrong_key_is_served_when_not_enforced() {
        let request = agent_request(r#"{"message": "hi"}"#, Some("wrong"));
        let (status, body) = call(app(false), request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("status").is_none());
        assert_eq!(body["turns"], 1);
    }

    #[tokio::test]
    async fn wrong_key_is_rejected_when_enforced() {
        let request = agent_request(r#"{"message": "hi"}"#, None);
        let (status, body) = call(app(true), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Invalid API Key");
    }

    #[tokio::test]
    async fn empty_body_uses_defaults() {
        let request = agent_request("", Some("secret"));
        let (status, body) = call(app(false), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["turns"], 1);
        assert_eq!(body["scam_detected"], false);
        assert_eq!(body["agent_reply"], "");
    }
}
