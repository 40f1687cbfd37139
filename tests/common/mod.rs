#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use std::sync::Mutex;
use std::time::Duration;

use github_notify::config::WebhookConfig;
use github_notify::error::NotifierError;
use github_notify::notify::ChatSender;
use github_notify::webhooks::{event_channel, router, signature, EventReceiver, WebhookState};

pub const SECRET: &str = "test-secret";
pub const PATH: &str = "/postreceive";

/// Webhook router wired to a fresh queue.
pub fn webhook_app(secret: &str, capacity: usize, send_timeout: Duration) -> (Router, EventReceiver) {
    let config = WebhookConfig {
        enabled: true,
        secret: secret.to_string(),
        queue_capacity: capacity,
        send_timeout_ms: send_timeout.as_millis() as u64,
        ..WebhookConfig::default()
    };
    let (tx, rx) = event_channel(capacity, send_timeout);
    (router(WebhookState::new(&config, tx)), rx)
}

pub fn webhook_request(event_type: &str, body: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(PATH)
        .header("content-type", "application/json")
        .header("X-GitHub-Event", event_type)
        .header("X-GitHub-Delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    if let Some(signature) = signature {
        builder = builder.header("X-Hub-Signature", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn signed_request(event_type: &str, body: &str) -> Request<Body> {
    webhook_request(event_type, body, Some(signature::sign(SECRET, body.as_bytes())))
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn drain(rx: &mut EventReceiver) -> usize {
    let mut count = 0;
    while rx.try_recv().is_some() {
        count += 1;
    }
    count
}

pub fn star_body(sender: &str) -> String {
    serde_json::json!({
        "action": "created",
        "sender": { "login": sender },
        "repository": {
            "name": "proj",
            "owner": { "login": "bob" },
            "stargazers_count": 7
        }
    })
    .to_string()
}

/// ChatSender that records messages instead of sending them.
#[derive(Default)]
pub struct RecordingSender {
    pub private: Mutex<Vec<(i64, String)>>,
    pub group: Mutex<Vec<(i64, String)>>,
    pub fail_private: bool,
}

impl RecordingSender {
    pub fn failing_private() -> Self {
        Self {
            fail_private: true,
            ..Self::default()
        }
    }

    pub fn private_messages(&self) -> Vec<(i64, String)> {
        self.private.lock().unwrap().clone()
    }

    pub fn group_messages(&self) -> Vec<(i64, String)> {
        self.group.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSender for RecordingSender {
    async fn send_private_msg(&self, user_id: i64, message: &str) -> Result<(), NotifierError> {
        if self.fail_private {
            return Err(NotifierError::DeliveryError("adapter unavailable".into()));
        }
        self.private.lock().unwrap().push((user_id, message.to_string()));
        Ok(())
    }

    async fn send_group_msg(&self, group_id: i64, message: &str) -> Result<(), NotifierError> {
        self.group.lock().unwrap().push((group_id, message.to_string()));
        Ok(())
    }
}
