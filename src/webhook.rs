//! Slack Events API webhook handlers
//!
//! Request flow: verify signature → decode envelope → filter → resolve the
//! thread's parent message → record the reply. Everything past the
//! signature gate answers HTTP 200, including internal failures, so Slack
//! does not re-deliver the event.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::signature::SignatureVerifier;
use crate::slack_api::{SlackApiClient, extract_correlation_token};
use crate::storage::{MessageStore, ThreadReply};
use crate::types::{EventEnvelope, MessageEvent};

/// Webhook server state, built once at startup and shared by all requests
#[derive(Clone)]
pub struct WebhookState {
    pub config: AppConfig,
    pub verifier: SignatureVerifier,
    pub slack: SlackApiClient,
    pub store: Arc<MessageStore>,
}

impl WebhookState {
    pub fn new(config: AppConfig, store: Arc<MessageStore>) -> Self {
        let verifier = SignatureVerifier::new(config.signing_secret.clone());
        let slack = SlackApiClient::new(config.api_base.clone(), config.bot_token.clone());
        Self {
            config,
            verifier,
            slack,
            store,
        }
    }
}

/// Build the webhook router
pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/slack/events", post(handle_event))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// Run the webhook HTTP server
pub async fn run_server(addr: SocketAddr, state: WebhookState) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Middleware to log all incoming HTTP requests
async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("🌐 HTTP {} {}", method, path);

    let response = next.run(req).await;

    info!("📤 Response status: {}", response.status());

    response
}

/// Handle an Events API delivery (POST request from Slack)
async fn handle_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let timestamp = headers
        .get("X-Slack-Request-Timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let signature = headers
        .get("X-Slack-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !state.verifier.verify(&body, timestamp, signature) {
        warn!("Invalid signature on webhook request");
        return StatusCode::FORBIDDEN.into_response();
    }

    if state.config.debug_mode {
        debug!("Raw event payload: {}", String::from_utf8_lossy(&body));
    }

    let envelope: EventEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Failed to parse event payload: {}", e);
            return StatusCode::OK.into_response();
        }
    };

    match envelope.kind.as_str() {
        // Sent once when the endpoint URL is configured in Slack; answered
        // with the literal challenge as plain text.
        "url_verification" => envelope.challenge.unwrap_or_default().into_response(),
        "event_callback" => {
            if let Some(event) = envelope.event {
                if event.is_thread_reply_in(&state.config.target_channel) {
                    record_thread_reply(&state, &event).await;
                } else {
                    debug!("Ignoring non-qualifying event");
                }
            }
            StatusCode::OK.into_response()
        }
        other => {
            debug!("Ignoring payload type {}", other);
            StatusCode::OK.into_response()
        }
    }
}

/// Record one threaded reply against its parent message
///
/// Any miss along the way abandons the recording with a logged reason; the
/// HTTP response is 200 regardless.
async fn record_thread_reply(state: &WebhookState, event: &MessageEvent) {
    let Some(thread_ts) = event.thread_ts.as_deref() else {
        return;
    };

    let Some(parent_text) = state
        .slack
        .fetch_thread_parent_text(&state.config.target_channel, thread_ts)
        .await
    else {
        warn!("Could not fetch parent message for thread {}", thread_ts);
        return;
    };

    let token = extract_correlation_token(&parent_text);
    let Some(message_id) = state.store.find_max_message_id(&token).await else {
        warn!("No stored message matches token {:?}, dropping reply", token);
        return;
    };

    let reply = ThreadReply::new(message_id, event.text.clone().unwrap_or_default());
    if state.store.insert_reply(&reply).await {
        info!(
            "Recorded reply to message {} from thread {}",
            message_id, thread_ts
        );
    }
}
