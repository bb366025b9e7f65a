//! Webhook endpoint and request lifecycle.
//!
//! One inbound delivery is one logical task: authenticate, acknowledge (or
//! hold the response for slash commands), normalize, hand off. Concurrent
//! deliveries share nothing but the read-only identity cache.

use std::sync::Arc;

use {
    axum::{
        Router,
        body::Bytes,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Json, Response},
        routing::{get, post},
    },
    chrono::Utc,
    secrecy::ExposeSecret,
    tracing::{debug, error, info, warn},
};

use castor_ryver::{
    BotIdentity, IdentityCache, MessageHandler, RawEvent, ReplySink, normalize,
    signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};

use crate::config::GatewayConfig;

/// Shared state behind the webhook endpoint.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub identity: Arc<IdentityCache>,
    pub handler: Arc<dyn MessageHandler>,
}

/// Build the gateway router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(&state.config.webhook_path, post(webhook_handler))
        .with_state(state)
}

/// Bind and serve until shutdown.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.bind, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, path = %state.config.webhook_path, "gateway listening");
    axum::serve(listener, build_app(state)).await?;
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST <webhook_path>`.
///
/// Signature verification runs over the exact body bytes before anything
/// is parsed. Non-command events are acknowledged immediately and processed
/// on a spawned task; slash commands hold the response until the handler
/// resolves (or drops) the reply sink.
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let secret = state
        .config
        .ryver
        .app_secret
        .as_ref()
        .map(|s| s.expose_secret().as_str());
    let result = signature::verify(
        header_str(&headers, SIGNATURE_HEADER),
        header_str(&headers, TIMESTAMP_HEADER),
        &body,
        secret,
        Utc::now(),
    );
    if let Err(reason) = result {
        info!(%reason, "rejected webhook request");
        return (StatusCode::UNAUTHORIZED, "Signature validation failed").into_response();
    }

    let Some(identity) = state.identity.get().cloned() else {
        error!("bot identity not set; dropping webhook request");
        return StatusCode::OK.into_response();
    };

    let event: RawEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("unrecognized webhook payload: {e}");
            return StatusCode::OK.into_response();
        },
    };

    if matches!(event, RawEvent::Command(_)) {
        let (sink, rx) = ReplySink::channel();
        let task_state = state.clone();
        tokio::spawn(async move {
            process_event(task_state, event, identity, Some(sink)).await;
        });
        match rx.await {
            Ok(reply) => Json(reply).into_response(),
            // Sink dropped: nothing to say, finish the request empty.
            Err(_) => StatusCode::OK.into_response(),
        }
    } else {
        tokio::spawn(async move {
            process_event(state, event, identity, None).await;
        });
        StatusCode::OK.into_response()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

async fn process_event(
    state: AppState,
    event: RawEvent,
    identity: BotIdentity,
    reply: Option<ReplySink>,
) {
    let message = match normalize(&event, &identity) {
        Ok(message) => message,
        Err(e) => {
            warn!("dropping webhook event: {e}");
            return;
        },
    };

    if message.user_id == identity.id && !state.config.ryver.allow_bot_originated_messages {
        debug!(user_id = message.user_id, "skipping bot-originated message");
        return;
    }

    debug!(kind = ?message.kind, channel = %message.channel, "inbound message");
    state.handler.on_message(message, reply).await;
}
