// Activity Model
// Entries for the recent-activity feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a recorded lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Started,
    Completed,
    Error,
    Stopped,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActivityKind::Started => "started",
            ActivityKind::Completed => "completed",
            ActivityKind::Error => "error",
            ActivityKind::Stopped => "stopped",
        };
        write!(f, "{label}")
    }
}

/// One recent-activity card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    /// Short headline, usually the stream title
    pub title: String,

    /// One-line description of what happened
    pub description: String,

    pub kind: ActivityKind,

    /// When the event was recorded
    pub time: DateTime<Utc>,
}

impl ActivityEntry {
    /// Create an entry stamped with the current time
    pub fn new(kind: ActivityKind, title: String, description: String) -> Self {
        Self {
            title,
            description,
            kind,
            time: Utc::now(),
        }
    }
}
