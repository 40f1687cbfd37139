//! Inbound chat events from the bot adapter.

pub mod envelope;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::search::{parse_command, GitHubSearch};

pub use envelope::{EnvelopeError, EnvelopeKey};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageEvent {
    pub post_type: String,
    pub message_type: String,
    pub user_id: i64,
    pub group_id: i64,
    pub raw_message: String,
}

#[derive(Clone)]
pub struct ChatState {
    search: Arc<GitHubSearch>,
    key: Option<EnvelopeKey>,
}

/// Chat ingress. With a key, only sealed events are accepted.
pub fn router(search: Arc<GitHubSearch>, key: Option<EnvelopeKey>) -> Router {
    Router::new()
        .route("/", post(handle_message))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(ChatState { search, key })
}

type Reply = (StatusCode, Json<Value>);

fn received() -> Reply {
    (StatusCode::OK, Json(json!({ "code": 200, "msg": "received" })))
}

fn unauthorized() -> Reply {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "code": 401, "msg": "unauthorized" })),
    )
}

/// Acknowledges right away; the search reply is sent from a task. Bodies that
/// fail to open with the configured key are rejected and never dispatched.
pub async fn handle_message(State(state): State<ChatState>, body: Bytes) -> Reply {
    let raw = match &state.key {
        Some(key) => match key.open_body(&body) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Rejected chat event: {}", e);
                return unauthorized();
            }
        },
        None => body.to_vec(),
    };

    let event: MessageEvent = match serde_json::from_slice(&raw) {
        Ok(event) => event,
        Err(e) => {
            warn!("Unparseable chat event: {}", e);
            return received();
        }
    };
    if event.post_type != "message" {
        debug!("Ignoring {:?} chat event", event.post_type);
        return received();
    }
    let Some(command) = parse_command(&event.raw_message) else {
        return received();
    };

    let search = state.search;
    let (user_id, group_id) = (event.user_id, event.group_id);
    match event.message_type.as_str() {
        "private" => {
            tokio::spawn(async move { search.reply_private(user_id, &command).await });
        }
        "group" => {
            tokio::spawn(async move { search.reply_group(group_id, &command).await });
        }
        other => debug!("Ignoring search from {:?} message", other),
    }
    received()
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "github-notify",
        "timestamp": chrono::Utc::now()
    }))
}
