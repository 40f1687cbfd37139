use reqwest::{header::USER_AGENT, Client, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::NotifierError;
use crate::notify::cq;
use crate::notify::sender::ChatSender;
use crate::search::command::{SearchCommand, SearchMode};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.182 Safari/537.36";

/// Repository lookup against the GitHub search API.
pub struct GitHubSearch {
    api_base: String,
    http_client: Client,
    sender: Arc<dyn ChatSender>,
}

fn or_none(text: &str) -> &str {
    if text.is_empty() {
        "None"
    } else {
        text
    }
}

fn text(repo: &Value, pointer: &str) -> String {
    crate::webhooks::normalize::lookup(repo, pointer)
}

fn count(repo: &Value, key: &str) -> i64 {
    repo.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Render the first hit of a search response.
pub fn format_result(mode: SearchMode, body: &Value) -> String {
    if body.get("total_count").and_then(Value::as_i64).unwrap_or(0) == 0 {
        return "ERROR: no such repository found".to_string();
    }
    let Some(repo) = body.pointer("/items/0") else {
        return "ERROR: no such repository found".to_string();
    };
    let full_name = text(repo, "/full_name");
    let card = cq::opengraph(&full_name);
    if mode == SearchMode::Picture {
        return card;
    }

    let summary = format!(
        "{}\nDescription: {}\nStar/Fork/Issue: {}/{}/{}\nLanguage: {}\nLicense: {}\nLast pushed: {}\nJump: {}\n",
        full_name,
        text(repo, "/description"),
        count(repo, "watchers"),
        count(repo, "forks"),
        count(repo, "open_issues"),
        or_none(&text(repo, "/language")),
        or_none(&text(repo, "/license/key")),
        text(repo, "/pushed_at"),
        text(repo, "/html_url"),
    );
    match mode {
        SearchMode::Text => summary,
        _ => summary + &card,
    }
}

impl GitHubSearch {
    pub fn new(api_base: &str, sender: Arc<dyn ChatSender>) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            http_client: Client::new(),
            sender,
        }
    }

    async fn fetch(&self, keyword: &str) -> Result<Value, NotifierError> {
        let url = format!("{}/search/repositories", self.api_base);
        let response = self
            .http_client
            .get(&url)
            .query(&[("q", keyword)])
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| NotifierError::SearchError(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NotifierError::SearchError(format!("code {}", status.as_u16())));
        }
        response
            .json()
            .await
            .map_err(|e| NotifierError::SearchError(e.to_string()))
    }

    /// Always yields a message; failures are reported inline as `ERROR:...`.
    pub async fn search(&self, command: &SearchCommand) -> String {
        info!("Searching repositories for {:?}", command.keyword);
        match self.fetch(&command.keyword).await {
            Ok(body) => format_result(command.mode, &body),
            Err(NotifierError::SearchError(reason)) => format!("ERROR:{}", reason),
            Err(e) => format!("ERROR:{}", e),
        }
    }

    pub async fn reply_private(&self, user_id: i64, command: &SearchCommand) {
        let msg = self.search(command).await;
        if let Err(e) = self.sender.send_private_msg(user_id, &msg).await {
            error!("Search reply to user {} failed: {}", user_id, e);
        }
    }

    pub async fn reply_group(&self, group_id: i64, command: &SearchCommand) {
        let msg = self.search(command).await;
        if let Err(e) = self.sender.send_group_msg(group_id, &msg).await {
            error!("Search reply to group {} failed: {}", group_id, e);
        }
    }
}
