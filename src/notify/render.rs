//! Turns events into chat messages.

use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

use crate::notify::capture::{CaptureTarget, PageCapture};
use crate::notify::cq;
use crate::webhooks::event::{Event, EventType};
use crate::webhooks::normalize::lookup;

fn number(payload: &Value, pointer: &str) -> i64 {
    payload.pointer(pointer).and_then(Value::as_i64).unwrap_or(0)
}

fn labels(payload: &Value) -> String {
    payload
        .pointer("/issue/labels")
        .and_then(Value::as_array)
        .map(|labels| {
            labels
                .iter()
                .map(|l| format!("[{}]", l.get("name").and_then(Value::as_str).unwrap_or("")))
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Clone, Default)]
pub struct Renderer {
    capture: Option<Arc<dyn PageCapture>>,
}

impl Renderer {
    pub fn new(capture: Option<Arc<dyn PageCapture>>) -> Self {
        Self { capture }
    }

    /// `None` means the event is not worth a notification.
    pub async fn render(&self, event: &Event) -> Option<String> {
        match event.event_type {
            EventType::Star => self.star(event),
            EventType::Fork => Some(format!(
                "{} forked {}/{} (total {} forks)",
                event.from_user,
                event.owner,
                event.repo,
                number(&event.payload, "/repository/forks_count")
            )),
            EventType::Issues => self.issue(event).await,
            EventType::IssueComment => self.issue_comment(event).await,
            EventType::PullRequest => self.pull_request(event).await,
            _ => {
                warn!(
                    "Unhandled event type {} action {:?} from {}/{}",
                    event.event_type, event.action, event.owner, event.repo
                );
                None
            }
        }
    }

    fn star(&self, event: &Event) -> Option<String> {
        let verb = match event.action.as_str() {
            "created" => "starred",
            "deleted" => "unstarred",
            _ => return None,
        };
        Some(format!(
            "{} {} {}/{} (total {} stargazers)",
            event.from_user,
            verb,
            event.owner,
            event.repo,
            number(&event.payload, "/repository/stargazers_count")
        ))
    }

    /// Screenshot as an inline image, or `None` if capture is off or failed.
    async fn screenshot(&self, target: CaptureTarget) -> Option<String> {
        let capture = self.capture.as_ref()?;
        match capture.capture(&target).await {
            Ok(png) => Some(cq::image_bytes(&png)),
            Err(e) => {
                error!("Screenshot of {} failed: {:#}", target.url(), e);
                None
            }
        }
    }

    async fn issue(&self, event: &Event) -> Option<String> {
        if !matches!(event.action.as_str(), "opened" | "closed" | "reopened") {
            return None;
        }
        let payload = &event.payload;
        let issue_number = number(payload, "/issue/number");
        let url = lookup(payload, "/issue/html_url");

        let mut msg = format!(
            "{} {} issue {}/{} #{} \njump: {} \n",
            event.from_user, event.action, event.owner, event.repo, issue_number, url
        );
        let target = CaptureTarget::Issue {
            url,
            issue_id: lookup(payload, "/issue/id"),
        };
        match self.screenshot(target).await {
            Some(image) => msg.push_str(&image),
            None => {
                msg.push_str(&format!(
                    "{} Title: {} \nBody: {} \n",
                    labels(payload),
                    lookup(payload, "/issue/title"),
                    lookup(payload, "/issue/body")
                ));
                msg.push_str(&cq::opengraph(&format!(
                    "{}/{}/issues/{}",
                    event.owner, event.repo, issue_number
                )));
            }
        }
        Some(msg)
    }

    async fn issue_comment(&self, event: &Event) -> Option<String> {
        let payload = &event.payload;
        let issue_number = number(payload, "/issue/number");
        let url = lookup(payload, "/comment/html_url");
        let details = format!(
            "{} Title: {} \nBody: {} \nComment: {} \n",
            labels(payload),
            lookup(payload, "/issue/title"),
            lookup(payload, "/issue/body"),
            lookup(payload, "/comment/body")
        );

        let verb = match event.action.as_str() {
            "created" => "commented on",
            "edited" => "edited comment on",
            "deleted" => {
                return Some(format!(
                    "{} deleted comment on {}/{} #{} \n{}jump: {} \n",
                    event.from_user, event.owner, event.repo, issue_number, details, url
                ));
            }
            _ => return None,
        };

        let mut msg = format!(
            "{} {} {}/{} #{} \njump: {} \n",
            event.from_user, verb, event.owner, event.repo, issue_number, url
        );
        let target = CaptureTarget::IssueComment {
            url,
            comment_id: lookup(payload, "/comment/id"),
        };
        match self.screenshot(target).await {
            Some(image) => msg.push_str(&image),
            None => msg.push_str(&details),
        }
        Some(msg)
    }

    /// Only newly opened pull requests are announced.
    async fn pull_request(&self, event: &Event) -> Option<String> {
        if event.action != "opened" {
            return None;
        }
        let payload = &event.payload;
        let pr_number = number(payload, "/pull_request/number");
        let url = lookup(payload, "/pull_request/html_url");
        let author = if event.from_user.is_empty() {
            lookup(payload, "/pull_request/user/login")
        } else {
            event.from_user.clone()
        };

        let mut msg = format!(
            "{} opened a pull request for {}/{} #{} ({}<-{}:{}) \njump: {} \n",
            author,
            event.base_owner,
            event.base_repo,
            pr_number,
            event.base_branch,
            event.owner,
            event.branch,
            url
        );
        match self.screenshot(CaptureTarget::PullRequest { url }).await {
            Some(image) => msg.push_str(&image),
            None => msg.push_str(&cq::opengraph(&format!(
                "{}/{}/pull/{}",
                event.base_owner, event.base_repo, pr_number
            ))),
        }
        Some(msg)
    }
}
