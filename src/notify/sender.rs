//! Outbound chat delivery through the bot adapter's HTTP API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::NotifierError;

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_private_msg(&self, user_id: i64, message: &str) -> Result<(), NotifierError>;

    async fn send_group_msg(&self, group_id: i64, message: &str) -> Result<(), NotifierError>;
}

#[derive(Serialize)]
struct PrivateMsg<'a> {
    user_id: i64,
    message: &'a str,
}

#[derive(Serialize)]
struct GroupMsg<'a> {
    group_id: i64,
    message: &'a str,
}

/// Client for the chat adapter (`/send_private_msg`, `/send_group_msg`).
pub struct AdapterClient {
    base_url: String,
    app_id: String,
    app_secret: String,
    http_client: Client,
}

impl AdapterClient {
    pub fn new(config: &AdapterConfig) -> Self {
        Self {
            base_url: config.addr.trim_end_matches('/').to_string(),
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            http_client: Client::new(),
        }
    }

    async fn post<T: Serialize + Sync>(&self, endpoint: &str, body: &T) -> Result<(), NotifierError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut request = self.http_client.post(&url).json(body);
        if !self.app_secret.is_empty() {
            request = request
                .bearer_auth(&self.app_secret)
                .header("X-App-Id", &self.app_id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(NotifierError::DeliveryError(format!(
                "{} returned {}: {}",
                endpoint, status, text
            )));
        }
        debug!("Delivered message via {}", endpoint);
        Ok(())
    }
}

#[async_trait]
impl ChatSender for AdapterClient {
    async fn send_private_msg(&self, user_id: i64, message: &str) -> Result<(), NotifierError> {
        self.post("send_private_msg", &PrivateMsg { user_id, message }).await
    }

    async fn send_group_msg(&self, group_id: i64, message: &str) -> Result<(), NotifierError> {
        self.post("send_group_msg", &GroupMsg { group_id, message }).await
    }
}
