//! Maps raw webhook payloads onto [`Event`].
//!
//! Each event type has a [`FieldMap`] of JSON pointers. Paths that are absent
//! resolve to an empty string, so once the type is recognized normalization
//! always succeeds. The one exception is `push`, which may be dropped
//! outright depending on its ref and on whether it carries `head_commit`.

use serde_json::Value;
use tracing::debug;

use crate::error::WebhookError;
use crate::webhooks::event::{Event, EventType};

/// Where each promoted field lives in the payload. `None` leaves it empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap {
    pub action: Option<&'static str>,
    pub owner: &'static str,
    pub repo: &'static str,
    pub branch: Option<&'static str>,
    pub commit: Option<&'static str>,
    pub from_user: Option<&'static str>,
    pub tag: Option<&'static str>,
    /// Owner, repository and branch of the base side of a pull request.
    pub base: Option<[&'static str; 3]>,
}

const PUSH: FieldMap = FieldMap {
    action: None,
    owner: "/repository/owner/name",
    repo: "/repository/name",
    branch: None,
    commit: Some("/head_commit/id"),
    from_user: None,
    tag: None,
    base: None,
};

const PULL_REQUEST_FAMILY: FieldMap = FieldMap {
    action: Some("/action"),
    owner: "/pull_request/head/repo/owner/login",
    repo: "/pull_request/head/repo/name",
    branch: Some("/pull_request/head/ref"),
    commit: Some("/pull_request/head/sha"),
    from_user: None,
    tag: None,
    base: Some([
        "/pull_request/base/repo/owner/login",
        "/pull_request/base/repo/name",
        "/pull_request/base/ref",
    ]),
};

const RELEASE: FieldMap = FieldMap {
    action: Some("/action"),
    owner: "/repository/owner/login",
    repo: "/repository/name",
    branch: Some("/release/target_commitish"),
    commit: Some("/head_commit/id"),
    from_user: Some("/sender/login"),
    tag: Some("/release/tag_name"),
    base: None,
};

const REPOSITORY_ACTIVITY: FieldMap = FieldMap {
    action: Some("/action"),
    owner: "/repository/owner/login",
    repo: "/repository/name",
    branch: None,
    commit: None,
    from_user: Some("/sender/login"),
    tag: None,
    base: None,
};

const CREATE: FieldMap = FieldMap {
    action: None,
    ..REPOSITORY_ACTIVITY
};

impl FieldMap {
    pub fn for_type(event_type: EventType) -> &'static FieldMap {
        match event_type {
            EventType::Push => &PUSH,
            EventType::PullRequest
            | EventType::PullRequestReview
            | EventType::PullRequestReviewComment => &PULL_REQUEST_FAMILY,
            EventType::Release => &RELEASE,
            EventType::Fork | EventType::Star | EventType::IssueComment | EventType::Issues => {
                &REPOSITORY_ACTIVITY
            }
            EventType::Create => &CREATE,
        }
    }
}

/// Read a scalar at `pointer` as text. Missing, null and container values
/// yield an empty string.
pub fn lookup(payload: &Value, pointer: &str) -> String {
    match payload.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn lookup_opt(payload: &Value, pointer: Option<&str>) -> String {
    pointer.map(|p| lookup(payload, p)).unwrap_or_default()
}

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    /// Accept `refs/tags/*` pushes in addition to branch pushes.
    pub allow_tags: bool,
}

impl Normalizer {
    pub fn new(allow_tags: bool) -> Self {
        Self { allow_tags }
    }

    /// Normalize a payload whose type tag has not been checked yet.
    pub fn normalize_tag(
        &self,
        event_type: &str,
        payload: Value,
    ) -> Result<Option<Event>, WebhookError> {
        let event_type: EventType = event_type
            .parse()
            .map_err(|_| WebhookError::UnknownEventType(event_type.to_string()))?;
        Ok(self.normalize(event_type, payload))
    }

    /// Returns `None` when the payload is a push that should be ignored.
    pub fn normalize(&self, event_type: EventType, payload: Value) -> Option<Event> {
        let map = FieldMap::for_type(event_type);
        let mut event = Event::new(event_type, Value::Null);

        if event_type == EventType::Push {
            let raw_ref = lookup(&payload, "/ref");
            // Pushes that carry head_commit are ignored, whatever its value.
            if payload.get("head_commit").is_some() {
                debug!("Ignoring push to {} carrying head_commit", raw_ref);
                return None;
            }
            if let Some(branch) = raw_ref.strip_prefix(BRANCH_PREFIX) {
                event.branch = branch.to_string();
            } else if let Some(tag) = raw_ref.strip_prefix(TAG_PREFIX).filter(|_| self.allow_tags) {
                // `tag` is reserved for releases; a pushed tag is reported as the ref name.
                event.branch = tag.to_string();
            } else {
                debug!("Ignoring push to non-branch ref {:?}", raw_ref);
                return None;
            }
        }

        event.action = lookup_opt(&payload, map.action);
        event.owner = lookup(&payload, map.owner);
        event.repo = lookup(&payload, map.repo);
        event.commit = lookup_opt(&payload, map.commit);
        event.from_user = lookup_opt(&payload, map.from_user);
        if let Some(branch) = map.branch {
            event.branch = lookup(&payload, branch);
        }
        if let Some(tag) = map.tag {
            event.tag = lookup(&payload, tag);
        }
        if let Some([owner, repo, branch]) = map.base {
            event.base_owner = lookup(&payload, owner);
            event.base_repo = lookup(&payload, repo);
            event.base_branch = lookup(&payload, branch);
            // Head and base repositories are reported together or not at all,
            // e.g. a PR whose fork was deleted has `head.repo: null`.
            let repos = [&event.owner, &event.repo, &event.base_owner, &event.base_repo];
            if repos.iter().any(|field| field.is_empty()) {
                if repos.iter().any(|field| !field.is_empty()) {
                    debug!("Partial repository info on {} event, clearing it", event_type);
                }
                event.owner.clear();
                event.repo.clear();
                event.base_owner.clear();
                event.base_repo.clear();
            }
        }

        event.payload = payload;
        Some(event)
    }
}
