//! Page screenshots through a remote WebDriver (Selenium / chromedriver).
//!
//! Only the handful of W3C WebDriver calls needed to photograph one element
//! of a GitHub page are implemented here.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// W3C element reference key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const CONTAINER_SELECTOR: &str = "#js-repo-pjax-container";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const WAIT_INTERVAL: Duration = Duration::from_millis(250);

/// Which part of which page to photograph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    Issue { url: String, issue_id: String },
    IssueComment { url: String, comment_id: String },
    PullRequest { url: String },
}

impl CaptureTarget {
    pub fn url(&self) -> &str {
        match self {
            CaptureTarget::Issue { url, .. }
            | CaptureTarget::IssueComment { url, .. }
            | CaptureTarget::PullRequest { url } => url,
        }
    }

    pub fn selector(&self) -> String {
        match self {
            CaptureTarget::Issue { issue_id, .. } => format!("#issue-{} > div", issue_id),
            CaptureTarget::IssueComment { comment_id, .. } => {
                format!("#issuecomment-{} > div", comment_id)
            }
            CaptureTarget::PullRequest { .. } => CONTAINER_SELECTOR.to_string(),
        }
    }
}

#[async_trait]
pub trait PageCapture: Send + Sync {
    /// PNG bytes of the target element.
    async fn capture(&self, target: &CaptureTarget) -> Result<Vec<u8>>;
}

pub struct WebDriverCapture {
    base_url: String,
    http_client: Client,
}

impl WebDriverCapture {
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("failed to build WebDriver HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    async fn call(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http_client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        if !status.is_success() {
            let message = payload
                .pointer("/value/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(anyhow!("WebDriver {} {}: {}", status, path, message));
        }
        Ok(payload.get("value").cloned().unwrap_or(Value::Null))
    }

    async fn new_session(&self) -> Result<String> {
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--headless", "--window-size=375,812"]
                    }
                }
            }
        });
        let value = self.call(reqwest::Method::POST, "/session", Some(capabilities)).await?;
        value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("WebDriver returned no sessionId"))
    }

    async fn find_element(&self, session: &str, selector: &str) -> Result<String> {
        let value = self
            .call(
                reqwest::Method::POST,
                &format!("/session/{}/element", session),
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no element matched {}", selector))
    }

    async fn wait_for_element(&self, session: &str, selector: &str) -> Result<String> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        loop {
            match self.find_element(session, selector).await {
                Ok(element) => return Ok(element),
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(_) => sleep(WAIT_INTERVAL).await,
            }
        }
    }

    async fn screenshot_in_session(&self, session: &str, target: &CaptureTarget) -> Result<Vec<u8>> {
        self.call(
            reqwest::Method::POST,
            &format!("/session/{}/url", session),
            Some(json!({ "url": target.url() })),
        )
        .await?;

        let container = self.wait_for_element(session, CONTAINER_SELECTOR).await?;
        let element = self.find_element(session, &target.selector()).await?;

        let rect = self
            .call(
                reqwest::Method::GET,
                &format!("/session/{}/element/{}/rect", session, container),
                None,
            )
            .await?;
        let width = rect.get("width").and_then(Value::as_f64).unwrap_or(375.0);
        let height = rect.get("height").and_then(Value::as_f64).unwrap_or(812.0);
        // Resizing is best effort; the element screenshot still works at the old size.
        // Window dimensions are integers in the W3C protocol.
        let window = json!({
            "width": width.ceil() as u64,
            "height": (height + 100.0).ceil() as u64,
        });
        if let Err(e) = self
            .call(
                reqwest::Method::POST,
                &format!("/session/{}/window/rect", session),
                Some(window),
            )
            .await
        {
            debug!("Window resize failed: {}", e);
        }

        let encoded = self
            .call(
                reqwest::Method::GET,
                &format!("/session/{}/element/{}/screenshot", session, element),
                None,
            )
            .await?;
        let encoded = encoded
            .as_str()
            .ok_or_else(|| anyhow!("screenshot response was not a string"))?;
        STANDARD
            .decode(encoded)
            .context("screenshot was not valid base64")
    }
}

#[async_trait]
impl PageCapture for WebDriverCapture {
    async fn capture(&self, target: &CaptureTarget) -> Result<Vec<u8>> {
        let session = self.new_session().await?;
        let result = self.screenshot_in_session(&session, target).await;

        if let Err(e) = self
            .call(reqwest::Method::DELETE, &format!("/session/{}", session), None)
            .await
        {
            warn!("Failed to close WebDriver session {}: {}", session, e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_selectors() {
        let issue = CaptureTarget::Issue {
            url: "https://github.com/bob/proj/issues/1".into(),
            issue_id: "99".into(),
        };
        assert_eq!(issue.selector(), "#issue-99 > div");
        assert_eq!(issue.url(), "https://github.com/bob/proj/issues/1");

        let comment = CaptureTarget::IssueComment {
            url: "u".into(),
            comment_id: "5".into(),
        };
        assert_eq!(comment.selector(), "#issuecomment-5 > div");

        let pr = CaptureTarget::PullRequest { url: "u".into() };
        assert_eq!(pr.selector(), "#js-repo-pjax-container");
    }
}
