use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Delivery error: {0}")]
    DeliveryError(String),

    #[error("Search error: {0}")]
    SearchError(String),
}

impl From<reqwest::Error> for NotifierError {
    fn from(err: reqwest::Error) -> Self {
        Self::DeliveryError(format!("HTTP error: {}", err))
    }
}

/// Rejections raised while ingesting a webhook request. Every variant maps to
/// exactly one HTTP status; nothing past the ingestion boundary sees these.
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("405 Method not allowed")]
    MethodNotAllowed,

    #[error("404 Not found")]
    NotFound,

    #[error("400 Bad Request - Missing X-GitHub-Event Header")]
    MissingEventType,

    #[error("400 Bad Request - Unknown Event Type {0}")]
    UnknownEventType(String),

    #[error("403 Forbidden - Missing X-Hub-Signature required for HMAC verification")]
    MissingSignature,

    #[error("403 Forbidden - HMAC verification failed")]
    SignatureMismatch,

    #[error("413 Payload Too Large - limit is {0} bytes")]
    PayloadTooLarge(usize),

    #[error("failed to read request body: {0}")]
    BodyUnreadable(String),

    #[error("error json request")]
    MalformedPayload(#[source] serde_json::Error),

    #[error("503 Service Unavailable - event queue is full")]
    ServiceOverloaded,

    #[error("503 Service Unavailable - event consumer has stopped")]
    ChannelClosed,
}

impl WebhookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingEventType | Self::UnknownEventType(_) => StatusCode::BAD_REQUEST,
            Self::MissingSignature | Self::SignatureMismatch => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::BodyUnreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            // Kept at 500 to match what existing senders already observe.
            Self::MalformedPayload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceOverloaded | Self::ChannelClosed => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
