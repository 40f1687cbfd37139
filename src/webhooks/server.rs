use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONTENT_LENGTH, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::LengthLimitError;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::webhooks::channel::EventSender;
use crate::webhooks::event::EventType;
use crate::webhooks::normalize::Normalizer;
use crate::webhooks::signature::{self, SIGNATURE_HEADER};

pub const EVENT_HEADER: &str = "X-GitHub-Event";
pub const DELIVERY_HEADER: &str = "X-GitHub-Delivery";

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct IngestSettings {
    path: String,
    secret: String,
    normalizer: Normalizer,
    max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct WebhookState {
    settings: Arc<IngestSettings>,
    sender: EventSender,
}

impl WebhookState {
    pub fn new(config: &WebhookConfig, sender: EventSender) -> Self {
        Self {
            settings: Arc::new(IngestSettings {
                path: config.path.clone(),
                secret: config.secret.clone(),
                normalizer: Normalizer::new(config.allow_tags),
                max_body_bytes: MAX_BODY_BYTES,
            }),
            sender,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        let mut settings = (*self.settings).clone();
        settings.max_body_bytes = max_body_bytes;
        self.settings = Arc::new(settings);
        self
    }
}

/// The webhook listener. Every method and path reaches `handle_webhook`, which
/// does its own method and path checks.
pub fn router(state: WebhookState) -> Router {
    Router::new()
        .fallback(handle_webhook)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .into_inner(),
        )
        .with_state(state)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn handle_webhook(
    State(state): State<WebhookState>,
    request: Request,
) -> Result<Response, WebhookError> {
    let settings = &state.settings;

    if request.method() != Method::POST {
        return Err(WebhookError::MethodNotAllowed);
    }
    if request.uri().path() != settings.path {
        return Err(WebhookError::NotFound);
    }

    let (parts, body) = request.into_parts();
    let headers = &parts.headers;

    let raw_type = match header_str(headers, EVENT_HEADER) {
        Some(t) if !t.is_empty() => t,
        _ => return Err(WebhookError::MissingEventType),
    };
    let event_type: EventType = raw_type.parse().map_err(|_| {
        debug!("Rejecting unsupported event type {:?}", raw_type);
        WebhookError::UnknownEventType(raw_type.to_string())
    })?;

    let delivery = header_str(headers, DELIVERY_HEADER).unwrap_or("-");
    info!("Received {} webhook (delivery {})", event_type, delivery);

    let body = read_body(headers, body, settings.max_body_bytes).await?;

    signature::verify(&settings.secret, &body, header_str(headers, SIGNATURE_HEADER)).map_err(
        |e| {
            warn!("Signature check failed for delivery {}: {}", delivery, e);
            e
        },
    )?;

    let payload: Value = serde_json::from_slice(&body).map_err(WebhookError::MalformedPayload)?;

    let Some(event) = settings.normalizer.normalize(event_type, payload) else {
        return Ok(StatusCode::OK.into_response());
    };

    let summary = event.to_string();
    state.sender.enqueue(event).await?;
    debug!("Queued {} event (delivery {})", event_type, delivery);

    Ok((StatusCode::OK, summary).into_response())
}

async fn read_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<axum::body::Bytes, WebhookError> {
    let declared = header_str(headers, CONTENT_LENGTH.as_str()).and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(WebhookError::PayloadTooLarge(limit));
    }
    // Bodies without a Content-Length are cut off while streaming.
    to_bytes(body, limit).await.map_err(|e| {
        let inner = e.into_inner();
        if inner.is::<LengthLimitError>() {
            WebhookError::PayloadTooLarge(limit)
        } else {
            WebhookError::BodyUnreadable(inner.to_string())
        }
    })
}
