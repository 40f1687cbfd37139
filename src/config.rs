use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::NotifierError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub webhook: WebhookConfig,
    pub notify: NotifyTargets,
    pub adapter: AdapterConfig,
    pub capture: CaptureConfig,
    pub github_api_base: String,
    pub http_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub secret: String,
    pub port: u16,
    pub path: String,
    pub allow_tags: bool,
    pub queue_capacity: usize,
    pub send_timeout_ms: u64,
}

impl WebhookConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            secret: String::new(),
            port: 80,
            path: "/postreceive".to_string(),
            allow_tags: false,
            queue_capacity: 10,
            send_timeout_ms: 2000,
        }
    }
}

/// Chat destinations for webhook notifications. Zero means "not configured".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NotifyTargets {
    pub user_id: i64,
    pub group_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub addr: String,
    pub app_id: String,
    pub app_secret: String,
    /// Shared key for sealed chat ingress. Empty accepts plaintext events.
    pub encrypt_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub enabled: bool,
    pub webdriver_addr: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, NotifierError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NotifierError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str| lookup(key).map(|v| v == "true").unwrap_or(false);

        let webhook = WebhookConfig {
            enabled: flag("GITHUB_WEBHOOK_ENABLE"),
            secret: var("GITHUB_WEBHOOK_SECRET", ""),
            port: parse_var(&lookup, "GITHUB_WEBHOOK_PORT", "80")?,
            path: var("GITHUB_WEBHOOK_PATH", "/postreceive"),
            allow_tags: flag("GITHUB_WEBHOOK_ALLOW_TAGS"),
            queue_capacity: parse_var(&lookup, "GITHUB_WEBHOOK_QUEUE_CAPACITY", "10")?,
            send_timeout_ms: parse_var(&lookup, "GITHUB_WEBHOOK_SEND_TIMEOUT_MS", "2000")?,
        };

        if webhook.queue_capacity == 0 {
            return Err(NotifierError::ConfigError(
                "GITHUB_WEBHOOK_QUEUE_CAPACITY must be greater than zero".to_string(),
            ));
        }
        if !webhook.path.starts_with('/') {
            return Err(NotifierError::ConfigError(format!(
                "GITHUB_WEBHOOK_PATH must start with '/': {}",
                webhook.path
            )));
        }

        let notify = NotifyTargets {
            user_id: parse_var(&lookup, "GITHUB_WEBHOOK_NOTIFY_QQ", "0")?,
            group_id: parse_var(&lookup, "GITHUB_WEBHOOK_NOTIFY_GROUP", "0")?,
        };

        let adapter = AdapterConfig {
            addr: var("ADAPTER_ADDR", "http://127.0.0.1:5700"),
            app_id: var("APP_ID", ""),
            app_secret: var("APP_SECRET", ""),
            encrypt_key: var("APP_ENCRYPT_KEY", ""),
        };

        let capture = CaptureConfig {
            enabled: flag("SELENIUM_CHROME_ENABLE"),
            webdriver_addr: var("SELENIUM_CHROME_ADDR", "http://127.0.0.1:4444"),
        };

        Ok(AppConfig {
            webhook,
            notify,
            adapter,
            capture,
            github_api_base: var("GITHUB_API_BASE", "https://api.github.com"),
            http_port: parse_var(&lookup, "HTTP_PORT", "8080")?,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: &str) -> Result<T, NotifierError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| NotifierError::ConfigError(format!("Invalid {}={:?}: {}", key, raw, e)))
}
