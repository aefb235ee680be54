//! Activity events consumed by the host's activity feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of activity event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Info,
    Success,
    Error,
    Skip,
    Match,
}

/// A structured log event. Emitted in causal order, one stream per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: EventKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<i32>,
    pub at: DateTime<Utc>,
}

impl ActivityEvent {
    fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            job_title: None,
            match_score: None,
            at: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(EventKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(EventKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, message)
    }

    pub fn skip(message: impl Into<String>) -> Self {
        Self::new(EventKind::Skip, message)
    }

    pub fn matched(message: impl Into<String>) -> Self {
        Self::new(EventKind::Match, message)
    }

    pub fn with_job_title(mut self, title: impl Into<String>) -> Self {
        self.job_title = Some(title.into());
        self
    }

    pub fn with_match_score(mut self, score: i32) -> Self {
        self.match_score = Some(score);
        self
    }
}
