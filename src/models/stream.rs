// Stream Model
// Ingest job records and their status lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an ingest job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    /// Accepted by the server, ingestion not yet running
    Pending,
    /// Actively pulling and transcoding the source
    // Older servers report this phase as PROCESSING
    #[serde(alias = "PROCESSING")]
    Ingesting,
    /// Ingestion finished, final MP4 available
    Completed,
    /// Interrupted on request before completion
    Stopped,
    /// Ingestion failed
    Error,
}

impl StreamStatus {
    /// Whether the job still occupies an ingest slot
    pub fn is_active(&self) -> bool {
        matches!(self, StreamStatus::Pending | StreamStatus::Ingesting)
    }

    /// Whether the status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamStatus::Completed | StreamStatus::Stopped | StreamStatus::Error
        )
    }

    /// Whether the lifecycle allows moving from this status to `next`
    pub fn can_transition_to(&self, next: StreamStatus) -> bool {
        matches!(
            (self, next),
            (StreamStatus::Pending, StreamStatus::Ingesting)
                | (StreamStatus::Pending, StreamStatus::Stopped)
                | (StreamStatus::Ingesting, StreamStatus::Completed)
                | (StreamStatus::Ingesting, StreamStatus::Stopped)
                | (StreamStatus::Ingesting, StreamStatus::Error)
        )
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StreamStatus::Pending => "pending",
            StreamStatus::Ingesting => "ingesting",
            StreamStatus::Completed => "completed",
            StreamStatus::Stopped => "stopped",
            StreamStatus::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Rendition quality label, ordered lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "480p")]
    Q480,
    #[serde(rename = "720p")]
    Q720,
    #[serde(rename = "1080p")]
    Q1080,
    #[serde(rename = "1440p")]
    Q1440,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Quality::Q480 => "480p",
            Quality::Q720 => "720p",
            Quality::Q1080 => "1080p",
            Quality::Q1440 => "1440p",
        };
        write!(f, "{label}")
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "480p" => Ok(Quality::Q480),
            "720p" => Ok(Quality::Q720),
            "1080p" => Ok(Quality::Q1080),
            "1440p" => Ok(Quality::Q1440),
            other => Err(format!("Unknown quality: {other}")),
        }
    }
}

/// A registered ingest job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    /// Unique identifier, caller-supplied or generated
    pub id: String,

    /// Source location being ingested
    pub url: String,

    /// Display title, derived from the source host when not supplied
    pub title: String,

    /// Source platform label (host without a leading www.)
    pub platform: String,

    /// Current lifecycle status
    pub status: StreamStatus,

    /// Rendition currently being produced
    pub current_quality: Quality,

    /// When the job was registered; never changes afterwards
    pub start_time: DateTime<Utc>,

    /// Stamped once on the first transition into a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,

    /// Server-side folder holding the job output
    pub output_folder: String,

    /// Present only for completed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_mp4_path: Option<String>,

    /// Present only for failed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Stream {
    /// Wall-clock seconds between start and end, or until now while running
    pub fn duration_secs(&self) -> i64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_seconds().max(0)
    }

    /// Elapsed time as `H:MM:SS` past the first hour, `M:SS` below it,
    /// or a placeholder while the job is still running
    pub fn duration_label(&self) -> String {
        if self.end_time.is_none() {
            return "in progress".to_string();
        }

        let total = self.duration_secs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, seconds)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_stream() -> Stream {
        Stream {
            id: "stream-demo-1".to_string(),
            url: "https://www.youtube.com/watch?v=demo".to_string(),
            title: "youtube.com".to_string(),
            platform: "youtube.com".to_string(),
            status: StreamStatus::Ingesting,
            current_quality: Quality::Q1080,
            start_time: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
            end_time: None,
            output_folder: "/streams/stream-demo-1".to_string(),
            final_mp4_path: None,
            error_message: None,
        }
    }

    #[test]
    fn test_active_and_terminal_split() {
        assert!(StreamStatus::Pending.is_active());
        assert!(StreamStatus::Ingesting.is_active());
        assert!(!StreamStatus::Completed.is_active());

        assert!(StreamStatus::Completed.is_terminal());
        assert!(StreamStatus::Stopped.is_terminal());
        assert!(StreamStatus::Error.is_terminal());
        assert!(!StreamStatus::Pending.is_terminal());
        assert!(!StreamStatus::Ingesting.is_terminal());
    }

    #[test]
    fn test_allowed_transitions() {
        assert!(StreamStatus::Pending.can_transition_to(StreamStatus::Ingesting));
        assert!(StreamStatus::Pending.can_transition_to(StreamStatus::Stopped));
        assert!(StreamStatus::Ingesting.can_transition_to(StreamStatus::Completed));
        assert!(StreamStatus::Ingesting.can_transition_to(StreamStatus::Stopped));
        assert!(StreamStatus::Ingesting.can_transition_to(StreamStatus::Error));
    }

    #[test]
    fn test_rejected_transitions() {
        // Failures only surface after ingestion has begun
        assert!(!StreamStatus::Pending.can_transition_to(StreamStatus::Completed));
        assert!(!StreamStatus::Pending.can_transition_to(StreamStatus::Error));

        for terminal in [
            StreamStatus::Completed,
            StreamStatus::Stopped,
            StreamStatus::Error,
        ] {
            assert!(!terminal.can_transition_to(StreamStatus::Pending));
            assert!(!terminal.can_transition_to(StreamStatus::Ingesting));
            assert!(!terminal.can_transition_to(StreamStatus::Stopped));
        }
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&StreamStatus::Ingesting).unwrap();
        assert_eq!(json, "\"INGESTING\"");

        // Legacy spelling from older servers maps onto the same variant
        let legacy: StreamStatus = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert_eq!(legacy, StreamStatus::Ingesting);

        let stopped: StreamStatus = serde_json::from_str("\"STOPPED\"").unwrap();
        assert_eq!(stopped, StreamStatus::Stopped);
    }

    #[test]
    fn test_quality_ordering_and_parse() {
        assert!(Quality::Q480 < Quality::Q720);
        assert!(Quality::Q720 < Quality::Q1080);
        assert!(Quality::Q1080 < Quality::Q1440);

        assert_eq!("1080p".parse::<Quality>().unwrap(), Quality::Q1080);
        assert_eq!(Quality::Q720.to_string(), "720p");
        assert!("4K".parse::<Quality>().is_err());

        let json = serde_json::to_string(&Quality::Q480).unwrap();
        assert_eq!(json, "\"480p\"");
    }

    #[test]
    fn test_duration_label_running() {
        let stream = sample_stream();
        assert_eq!(stream.duration_label(), "in progress");
    }

    #[test]
    fn test_duration_label_finished() {
        let mut stream = sample_stream();
        stream.end_time = Some(Utc.with_ymd_and_hms(2024, 5, 10, 12, 5, 30).unwrap());
        assert_eq!(stream.duration_label(), "5:30");

        stream.end_time = Some(Utc.with_ymd_and_hms(2024, 5, 10, 13, 23, 45).unwrap());
        assert_eq!(stream.duration_label(), "1:23:45");
    }

    #[test]
    fn test_stream_serializes_camel_case() {
        let stream = sample_stream();
        let value = serde_json::to_value(&stream).unwrap();

        assert_eq!(value["currentQuality"], "1080p");
        assert_eq!(value["status"], "INGESTING");
        assert_eq!(value["outputFolder"], "/streams/stream-demo-1");
        // Unset terminal fields stay off the wire entirely
        assert!(value.get("endTime").is_none());
        assert!(value.get("finalMp4Path").is_none());
    }
}
