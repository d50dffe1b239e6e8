// Stream Registry
// Local collection of ingestion jobs and the rules for moving between statuses

use crate::models::{ActivityEntry, ActivityKind, IngestStats, Quality, Stream, StreamStatus};
use crate::services::activity_log::ActivityLog;
use crate::services::events::{emit_event, EventSink};
use crate::services::gateway::{platform_from_url, ApiStream, GatewayError, IngestGateway};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Failure registering or transitioning a stream
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The request was malformed; nothing was sent to the server
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Every ingest slot is taken; the request was rejected, not queued
    #[error("All {max} ingest slots are in use")]
    CapacityExceeded { max: u32 },

    /// No stream with the given id
    #[error("Unknown stream: {0}")]
    NotFound(String),

    /// The requested status change is not allowed by the lifecycle
    #[error("Stream {id} is {from} and cannot change to {to}")]
    InvalidTransition {
        id: String,
        from: StreamStatus,
        to: StreamStatus,
    },

    /// The server call failed; local state is unchanged
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Extra fields carried by a status change. Completion requires the MP4
/// path, failure requires the error message.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub final_mp4_path: Option<String>,
    pub error_message: Option<String>,
}

struct RegistryState {
    streams: Vec<Stream>,
    max_concurrent: u32,
    server_max_seen: bool,
    websocket_connections: u32,
    default_quality: Quality,
}

/// Owns every stream the console knows about. All changes go through here
/// so the lifecycle rules hold: terminal streams never change again,
/// `end_time` is stamped exactly once, and the active count never passes
/// the slot limit. Server calls happen while the state lock is held, so a
/// failed call leaves local state exactly as it was.
pub struct StreamRegistry {
    gateway: Arc<dyn IngestGateway>,
    activity: Arc<ActivityLog>,
    events: Arc<dyn EventSink>,
    state: RwLock<RegistryState>,
}

impl StreamRegistry {
    pub fn new(
        gateway: Arc<dyn IngestGateway>,
        activity: Arc<ActivityLog>,
        events: Arc<dyn EventSink>,
        max_concurrent: u32,
        default_quality: Quality,
    ) -> Self {
        Self {
            gateway,
            activity,
            events,
            state: RwLock::new(RegistryState {
                streams: Vec::new(),
                max_concurrent: max_concurrent.max(1),
                server_max_seen: false,
                // The console's own socket counts as one connection
                websocket_connections: 1,
                default_quality,
            }),
        }
    }

    /// Register a new ingestion job. The URL must be nonblank and a free
    /// slot must exist; the server is asked to start ingesting before the
    /// local record is created. A requested id that is already taken is
    /// dropped and the server assigns one instead.
    pub async fn add(&self, url: &str, custom_id: Option<&str>) -> Result<Stream, RegistryError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(RegistryError::Validation("URL must not be empty".to_string()));
        }
        let custom_id = custom_id.map(str::trim).filter(|id| !id.is_empty());

        let mut state = self.state.write().await;

        let active = state.streams.iter().filter(|s| s.status.is_active()).count() as u32;
        if active >= state.max_concurrent {
            return Err(RegistryError::CapacityExceeded {
                max: state.max_concurrent,
            });
        }

        let requested = match custom_id {
            Some(custom) if state.streams.iter().any(|s| s.id == custom) => {
                log::warn!("Stream id {} is already in use, the server will assign one", custom);
                None
            }
            other => other,
        };

        let response = self.gateway.start_stream(url, requested).await?;
        let id = if response.stream_id.is_empty() {
            format!("stream-{}", Uuid::new_v4())
        } else {
            response.stream_id
        };

        let platform = platform_from_url(url);
        let output_folder = format!("/streams/{}", id);
        let stream = Stream {
            id,
            url: url.to_string(),
            title: platform.clone(),
            platform,
            status: StreamStatus::Pending,
            current_quality: state.default_quality,
            start_time: Utc::now(),
            end_time: None,
            output_folder,
            final_mp4_path: None,
            error_message: None,
        };
        state.streams.push(stream.clone());
        drop(state);

        let (title, description) = describe_transition(&stream, ActivityKind::Started);
        self.activity
            .record_event(ActivityKind::Started, &title, &description);
        emit_event(self.events.as_ref(), "stream://started", &stream);
        log::info!("Registered stream {} for {}", stream.id, stream.url);

        Ok(stream)
    }

    /// Ask the server to stop a stream, then mark it stopped locally.
    /// Stopping an already stopped stream is a no-op; other terminal
    /// streams reject the change.
    pub async fn stop(&self, id: &str) -> Result<Stream, RegistryError> {
        let mut state = self.state.write().await;

        let stream = state
            .streams
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if stream.status == StreamStatus::Stopped {
            return Ok(stream.clone());
        }
        if !stream.status.can_transition_to(StreamStatus::Stopped) {
            return Err(RegistryError::InvalidTransition {
                id: stream.id.clone(),
                from: stream.status,
                to: StreamStatus::Stopped,
            });
        }

        self.gateway.stop_stream(id).await?;

        apply_status(stream, StreamStatus::Stopped, StatusUpdate::default())?;
        let snapshot = stream.clone();
        drop(state);

        self.finish_transition(&snapshot, kind_for(StreamStatus::Stopped));
        Ok(snapshot)
    }

    /// Apply a status change reported for one stream. Re-reporting the
    /// current status is a harmless no-op.
    pub async fn update_status(
        &self,
        id: &str,
        next: StreamStatus,
        update: StatusUpdate,
    ) -> Result<Stream, RegistryError> {
        let mut state = self.state.write().await;

        let stream = state
            .streams
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        let changed = apply_status(stream, next, update)?;
        let snapshot = stream.clone();
        drop(state);

        if changed {
            self.finish_transition(&snapshot, kind_for(next));
        }
        Ok(snapshot)
    }

    /// Replace the local collection with the server's, keeping server
    /// order. Transitions observed for already known streams land in the
    /// activity feed; records the server dropped disappear here too.
    pub async fn apply_snapshot(&self, snapshot: Vec<ApiStream>, stats: Option<&IngestStats>) {
        let mut incoming: Vec<Stream> = snapshot.into_iter().map(ApiStream::into_stream).collect();

        // Terminal records from older servers can miss their terminal fields
        for stream in &mut incoming {
            if stream.status == StreamStatus::Completed && stream.final_mp4_path.is_none() {
                stream.final_mp4_path = Some(format!("{}/final.mp4", stream.output_folder));
            }
            if stream.status == StreamStatus::Error && stream.error_message.is_none() {
                stream.error_message = Some("Ingestion failed".to_string());
            }
            if stream.status.is_terminal() && stream.end_time.is_none() {
                stream.end_time = Some(Utc::now());
            }
        }

        let mut state = self.state.write().await;

        if let Some(stats) = stats {
            adopt_stats(&mut state, stats);
        }

        let mut transitions = Vec::new();
        for stream in &incoming {
            if let Some(previous) = state.streams.iter().find(|s| s.id == stream.id) {
                if previous.status != stream.status {
                    transitions.push((stream.clone(), kind_for(stream.status)));
                }
            }
        }

        state.streams = incoming;
        drop(state);

        for (stream, kind) in transitions {
            self.finish_transition(&stream, kind);
        }
    }

    /// Adopt server counters without touching the stream collection
    pub async fn apply_server_stats(&self, stats: &IngestStats) {
        let mut state = self.state.write().await;
        adopt_stats(&mut state, stats);
    }

    pub async fn get(&self, id: &str) -> Option<Stream> {
        let state = self.state.read().await;
        state.streams.iter().find(|s| s.id == id).cloned()
    }

    /// Every stream, oldest first
    pub async fn list(&self) -> Vec<Stream> {
        self.state.read().await.streams.clone()
    }

    /// Streams still holding a slot
    pub async fn active(&self) -> Vec<Stream> {
        let state = self.state.read().await;
        state
            .streams
            .iter()
            .filter(|s| s.status.is_active())
            .cloned()
            .collect()
    }

    /// Completed streams with a downloadable MP4
    pub async fn processed(&self) -> Vec<Stream> {
        let state = self.state.read().await;
        state
            .streams
            .iter()
            .filter(|s| s.status == StreamStatus::Completed)
            .cloned()
            .collect()
    }

    /// Dashboard counters derived from the current state
    pub async fn stats(&self) -> IngestStats {
        let state = self.state.read().await;
        compute_stats(&state)
    }

    /// Recent lifecycle events, newest first
    pub fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.activity.recent()
    }

    /// Browser-ready URL for a finished download
    pub fn download_url(&self, id: &str) -> String {
        self.gateway.download_url(id)
    }

    /// Adopt a locally configured slot limit. Ignored once the server has
    /// reported its own, and a zero limit is never adopted.
    pub async fn set_local_max(&self, max: u32) {
        let mut state = self.state.write().await;
        if !state.server_max_seen && max > 0 {
            state.max_concurrent = max;
        }
    }

    /// Rendition assigned to newly registered streams
    pub async fn set_default_quality(&self, quality: Quality) {
        self.state.write().await.default_quality = quality;
    }

    fn finish_transition(&self, stream: &Stream, kind: Option<ActivityKind>) {
        if let Some(kind) = kind {
            let (title, description) = describe_transition(stream, kind);
            self.activity.record_event(kind, &title, &description);
            emit_event(self.events.as_ref(), &format!("stream://{}", kind), stream);
        }
        log::info!("Stream {} is now {}", stream.id, stream.status);
    }
}

/// Apply a status change in place. `Ok(true)` means the record changed;
/// re-reporting the current status changes nothing. Checks run before any
/// field is touched, so an error leaves the record as it was.
fn apply_status(
    stream: &mut Stream,
    next: StreamStatus,
    update: StatusUpdate,
) -> Result<bool, RegistryError> {
    if stream.status == next {
        return Ok(false);
    }
    if !stream.status.can_transition_to(next) {
        return Err(RegistryError::InvalidTransition {
            id: stream.id.clone(),
            from: stream.status,
            to: next,
        });
    }

    let final_mp4_path = match next {
        StreamStatus::Completed => Some(update.final_mp4_path.ok_or_else(|| {
            RegistryError::Validation("a completed stream requires a final MP4 path".to_string())
        })?),
        _ => stream.final_mp4_path.clone(),
    };
    let error_message = match next {
        StreamStatus::Error => Some(update.error_message.ok_or_else(|| {
            RegistryError::Validation("a failed stream requires an error message".to_string())
        })?),
        _ => stream.error_message.clone(),
    };

    stream.status = next;
    stream.final_mp4_path = final_mp4_path;
    stream.error_message = error_message;
    if next.is_terminal() && stream.end_time.is_none() {
        stream.end_time = Some(Utc::now());
    }

    Ok(true)
}

fn adopt_stats(state: &mut RegistryState, stats: &IngestStats) {
    // A server that reports no limit keeps the local one in force
    if stats.max_concurrent_streams > 0 {
        state.max_concurrent = stats.max_concurrent_streams;
        state.server_max_seen = true;
    }
    state.websocket_connections = stats.websocket_connections;
}

fn kind_for(status: StreamStatus) -> Option<ActivityKind> {
    match status {
        StreamStatus::Completed => Some(ActivityKind::Completed),
        StreamStatus::Stopped => Some(ActivityKind::Stopped),
        StreamStatus::Error => Some(ActivityKind::Error),
        StreamStatus::Pending | StreamStatus::Ingesting => None,
    }
}

fn describe_transition(stream: &Stream, kind: ActivityKind) -> (String, String) {
    match kind {
        ActivityKind::Started => (
            format!("Stream {} started", stream.id),
            format!("Ingesting {}", stream.platform),
        ),
        ActivityKind::Completed => (
            format!("Stream {} completed", stream.id),
            "MP4 file ready for download".to_string(),
        ),
        ActivityKind::Stopped => (
            format!("Stream {} stopped", stream.id),
            "Ingestion stopped by request".to_string(),
        ),
        ActivityKind::Error => (
            format!("Stream {} failed", stream.id),
            stream
                .error_message
                .clone()
                .unwrap_or_else(|| "Ingestion failed".to_string()),
        ),
    }
}

/// Counters derived purely from registry state
fn compute_stats(state: &RegistryState) -> IngestStats {
    let active = state.streams.iter().filter(|s| s.status.is_active()).count() as u32;
    IngestStats {
        active_streams: active,
        available_slots: state.max_concurrent.saturating_sub(active),
        max_concurrent_streams: state.max_concurrent,
        total_streams: state.streams.len() as u32,
        websocket_connections: state.websocket_connections,
    }
}
