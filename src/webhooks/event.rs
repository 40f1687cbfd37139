use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of `X-GitHub-Event` values this service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Push,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    Release,
    Fork,
    Star,
    IssueComment,
    Issues,
    Create,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::Push,
        EventType::PullRequest,
        EventType::PullRequestReview,
        EventType::PullRequestReviewComment,
        EventType::Release,
        EventType::Fork,
        EventType::Star,
        EventType::IssueComment,
        EventType::Issues,
        EventType::Create,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Push => "push",
            EventType::PullRequest => "pull_request",
            EventType::PullRequestReview => "pull_request_review",
            EventType::PullRequestReviewComment => "pull_request_review_comment",
            EventType::Release => "release",
            EventType::Fork => "fork",
            EventType::Star => "star",
            EventType::IssueComment => "issue_comment",
            EventType::Issues => "issues",
            EventType::Create => "create",
        }
    }

    /// Pull request, review and review comment events share one field layout.
    pub fn is_pull_request_family(&self) -> bool {
        matches!(
            self,
            EventType::PullRequest
                | EventType::PullRequestReview
                | EventType::PullRequestReviewComment
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// A normalized webhook notification.
///
/// Only the fields every renderer needs are promoted; anything else is read
/// from `payload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_type: EventType,
    pub action: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub commit: String,
    pub from_user: String,
    pub tag: String,
    pub base_owner: String,
    pub base_repo: String,
    pub base_branch: String,
    pub payload: Value,
}

impl Event {
    pub fn new(event_type: EventType, payload: Value) -> Self {
        Self {
            event_type,
            action: String::new(),
            owner: String::new(),
            repo: String::new(),
            branch: String::new(),
            commit: String::new(),
            from_user: String::new(),
            tag: String::new(),
            base_owner: String::new(),
            base_repo: String::new(),
            base_branch: String::new(),
            payload,
        }
    }
}

const LABEL_WIDTH: usize = 8;

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type:   {}", self.event_type)?;
        writeln!(f, "owner:  {}", self.owner)?;
        writeln!(f, "repo:   {}", self.repo)?;
        writeln!(f, "branch: {}", self.branch)?;
        writeln!(f, "commit: {}", self.commit)?;

        if self.event_type == EventType::PullRequest {
            writeln!(f, "action: {}", self.action)?;
            writeln!(f, "bowner: {}", self.base_owner)?;
            writeln!(f, "brepo:  {}", self.base_repo)?;
            writeln!(f, "bbranch:{}", self.base_branch)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("unable to parse event string. Invalid Format")]
    InvalidFormat,

    #[error(transparent)]
    UnknownType(#[from] UnknownEventType),
}

/// Parses the text produced by `Display`. The payload is not part of that
/// text, so parsed events carry `Value::Null`.
impl FromStr for Event {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Trailing spaces are significant: an empty last value still has its label padding.
        let lines: Vec<&str> = s.trim_start().trim_end_matches('\n').split('\n').collect();

        if !matches!(lines.len(), 5 | 8 | 9) {
            return Err(EventParseError::InvalidFormat);
        }
        let mut values = Vec::with_capacity(lines.len());
        for line in &lines {
            match line.get(LABEL_WIDTH..) {
                Some(value) => values.push(value.to_string()),
                None => return Err(EventParseError::InvalidFormat),
            }
        }

        let event_type: EventType = values[0].parse()?;
        let mut event = Event::new(event_type, Value::Null);
        event.owner = values[1].clone();
        event.repo = values[2].clone();
        event.branch = values[3].clone();
        event.commit = values[4].clone();

        match (event_type, values.len()) {
            (EventType::PullRequest, 9) => {
                event.action = values[5].clone();
                event.base_owner = values[6].clone();
                event.base_repo = values[7].clone();
                event.base_branch = values[8].clone();
            }
            // Older producers omitted the action line.
            (EventType::PullRequest, 8) => {
                event.base_owner = values[5].clone();
                event.base_repo = values[6].clone();
                event.base_branch = values[7].clone();
            }
            (EventType::PullRequest, _) => return Err(EventParseError::InvalidFormat),
            (_, 5) => {}
            _ => return Err(EventParseError::InvalidFormat),
        }

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_closed_set() {
        for t in EventType::ALL {
            assert_eq!(t.as_str().parse::<EventType>().unwrap(), t);
        }
        assert!("ping".parse::<EventType>().is_err());
        assert!("".parse::<EventType>().is_err());
        assert!("Push".parse::<EventType>().is_err());
    }

    #[test]
    fn test_display_push_has_five_lines() {
        let mut event = Event::new(EventType::Push, Value::Null);
        event.owner = "bob".into();
        event.repo = "proj".into();
        event.branch = "main".into();

        let text = event.to_string();
        assert_eq!(text.lines().count(), 5);
        assert_eq!(text, "type:   push\nowner:  bob\nrepo:   proj\nbranch: main\ncommit: \n");
    }

    #[test]
    fn test_display_pull_request_has_nine_lines() {
        let mut event = Event::new(EventType::PullRequest, Value::Null);
        event.action = "opened".into();
        event.base_branch = "master".into();

        let text = event.to_string();
        assert_eq!(text.lines().count(), 9);
        assert!(text.contains("action: opened\n"));
        assert!(text.ends_with("bbranch:master\n"));
    }

    #[test]
    fn test_review_events_use_the_short_form() {
        let event = Event::new(EventType::PullRequestReview, Value::Null);
        assert_eq!(event.to_string().lines().count(), 5);
    }

    #[test]
    fn test_parse_text_form() {
        let mut event = Event::new(EventType::PullRequest, Value::Null);
        event.owner = "alice".into();
        event.repo = "fork".into();
        event.branch = "feature".into();
        event.commit = "abc123".into();
        event.action = "opened".into();
        event.base_owner = "bob".into();
        event.base_repo = "proj".into();
        event.base_branch = "main".into();

        let parsed: Event = event.to_string().parse().unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_parse_legacy_pull_request_form() {
        let text = "type:   pull_request\nowner:  a\nrepo:   r\nbranch: b\ncommit: c\nbowner: o\nbrepo:  p\nbbranch:m";
        let parsed: Event = text.parse().unwrap();
        assert_eq!(parsed.action, "");
        assert_eq!(parsed.base_owner, "o");
        assert_eq!(parsed.base_branch, "m");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert_eq!("type:   push".parse::<Event>(), Err(EventParseError::InvalidFormat));
        assert_eq!(
            "type:   push\nowner:\nrepo:   r\nbranch: b\ncommit: c".parse::<Event>(),
            Err(EventParseError::InvalidFormat)
        );
        let nine_line_push = "type:   push\nowner:  a\nrepo:   r\nbranch: b\ncommit: c\naction: x\nbowner: o\nbrepo:  p\nbbranch:m";
        assert_eq!(nine_line_push.parse::<Event>(), Err(EventParseError::InvalidFormat));
        assert!(matches!(
            "type:   ping\nowner:  a\nrepo:   r\nbranch: b\ncommit: c".parse::<Event>(),
            Err(EventParseError::UnknownType(_))
        ));
    }
}
