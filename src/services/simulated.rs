// Simulated Backend
// In-process stand-in for the ingestion server, for offline runs and tests

use crate::models::{ActivityKind, IngestStats, Quality, StreamStatus};
use crate::services::gateway::{
    platform_from_url, ApiActivity, ApiStream, ConnectionStatus, GatewayError, IngestGateway,
    StartStreamResponse, StopStreamResponse,
};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use reqwest::StatusCode;
use std::sync::Mutex;

const SIMULATED_BASE_URL: &str = "http://simulated.invalid";

// Polls a job sits in each phase; time only advances when the list is polled
const POLLS_BEFORE_INGEST: u32 = 1;
const POLLS_WHILE_INGESTING: u32 = 3;

const QUALITY_JITTER_CHANCE: f64 = 0.3;
const ACTIVITY_LIMIT: usize = 20;

struct SimStream {
    record: ApiStream,
    polls: u32,
}

struct SimState {
    streams: Vec<SimStream>,
    activity: Vec<ApiActivity>,
    rng: StdRng,
    counter: u64,
}

/// Fake ingestion server that lives inside the process. Jobs move through
/// the same lifecycle the real server drives, one phase per poll of the
/// stream list, and the same HTTP status codes come back as
/// [`GatewayError::Status`] values. Seed the generator for deterministic
/// runs in tests.
pub struct SimulatedBackend {
    state: Mutex<SimState>,
    max_concurrent: u32,
}

impl SimulatedBackend {
    pub fn new(max_concurrent: u32) -> Self {
        Self::with_rng(max_concurrent, StdRng::from_entropy())
    }

    /// Deterministic variant for tests
    pub fn seeded(max_concurrent: u32, seed: u64) -> Self {
        Self::with_rng(max_concurrent, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_concurrent: u32, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(SimState {
                streams: Vec::new(),
                activity: Vec::new(),
                rng,
                counter: 0,
            }),
            max_concurrent,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| {
            log::warn!("Simulated backend lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Force a job into the error state so failure handling can be exercised
    pub fn fail_stream(&self, id: &str, message: &str) {
        let mut state = self.lock();
        let SimState {
            streams, activity, ..
        } = &mut *state;

        if let Some(sim) = streams.iter_mut().find(|s| s.record.id == id) {
            if sim.record.status.is_terminal() {
                return;
            }
            sim.record.status = StreamStatus::Error;
            sim.record.error_message = Some(message.to_string());
            sim.record.end_time = Some(Utc::now());
            push_activity(
                activity,
                &format!("Stream {} failed", id),
                message,
                ActivityKind::Error,
            );
        }
    }
}

fn push_activity(
    activity: &mut Vec<ApiActivity>,
    title: &str,
    description: &str,
    kind: ActivityKind,
) {
    activity.insert(
        0,
        ApiActivity {
            title: title.to_string(),
            description: description.to_string(),
            kind,
            time: "just now".to_string(),
        },
    );
    activity.truncate(ACTIVITY_LIMIT);
}

/// Move every job one tick through its lifecycle
fn advance(state: &mut SimState) {
    let SimState {
        streams,
        activity,
        rng,
        ..
    } = state;

    for sim in streams.iter_mut() {
        if sim.record.status.is_terminal() {
            continue;
        }
        sim.polls += 1;

        match sim.record.status {
            StreamStatus::Pending if sim.polls > POLLS_BEFORE_INGEST => {
                sim.record.status = StreamStatus::Ingesting;
            }
            StreamStatus::Ingesting => {
                if sim.polls > POLLS_BEFORE_INGEST + POLLS_WHILE_INGESTING {
                    let folder = sim
                        .record
                        .output_folder
                        .clone()
                        .unwrap_or_else(|| format!("/streams/{}", sim.record.id));
                    sim.record.status = StreamStatus::Completed;
                    sim.record.final_mp4_path = Some(format!("{}/final.mp4", folder));
                    sim.record.end_time = Some(Utc::now());
                    push_activity(
                        activity,
                        &format!("Stream {} completed", sim.record.id),
                        "MP4 file ready for download",
                        ActivityKind::Completed,
                    );
                } else if rng.gen_bool(QUALITY_JITTER_CHANCE) {
                    // The real server renegotiates renditions mid-ingest
                    let ladder = [Quality::Q480, Quality::Q720, Quality::Q1080];
                    if let Some(quality) = ladder.choose(rng) {
                        sim.record.current_quality = *quality;
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl IngestGateway for SimulatedBackend {
    async fn health_check(&self) -> bool {
        true
    }

    async fn list_streams(&self) -> Result<Vec<ApiStream>, GatewayError> {
        let mut state = self.lock();
        advance(&mut state);
        Ok(state.streams.iter().map(|s| s.record.clone()).collect())
    }

    async fn get_stream(&self, id: &str) -> Result<ApiStream, GatewayError> {
        let state = self.lock();
        state
            .streams
            .iter()
            .find(|s| s.record.id == id)
            .map(|s| s.record.clone())
            .ok_or_else(|| GatewayError::from_status(StatusCode::NOT_FOUND))
    }

    async fn start_stream(
        &self,
        url: &str,
        custom_id: Option<&str>,
    ) -> Result<StartStreamResponse, GatewayError> {
        if url.trim().is_empty() {
            return Err(GatewayError::from_status(StatusCode::BAD_REQUEST));
        }

        let mut state = self.lock();

        let active = state
            .streams
            .iter()
            .filter(|s| s.record.status.is_active())
            .count() as u32;
        if active >= self.max_concurrent {
            return Err(GatewayError::from_status(StatusCode::SERVICE_UNAVAILABLE));
        }

        let id = match custom_id {
            Some(custom) => {
                if state.streams.iter().any(|s| s.record.id == custom) {
                    return Err(GatewayError::from_status(StatusCode::CONFLICT));
                }
                custom.to_string()
            }
            None => {
                state.counter += 1;
                format!("stream-{}", state.counter)
            }
        };

        let platform = platform_from_url(url);
        let record = ApiStream {
            id: id.clone(),
            url: url.to_string(),
            title: Some(platform.clone()),
            platform: platform.clone(),
            status: StreamStatus::Pending,
            current_quality: Quality::Q1080,
            start_time: Utc::now(),
            end_time: None,
            output_folder: Some(format!("/streams/{}", id)),
            final_mp4_path: None,
            error_message: None,
        };
        state.streams.push(SimStream { record, polls: 0 });
        push_activity(
            &mut state.activity,
            &format!("Stream {} started", id),
            &format!("Ingesting {}", platform),
            ActivityKind::Started,
        );

        Ok(StartStreamResponse {
            message: "Stream queued for ingestion".to_string(),
            stream_id: id,
        })
    }

    async fn stop_stream(&self, id: &str) -> Result<StopStreamResponse, GatewayError> {
        let mut state = self.lock();
        let SimState {
            streams, activity, ..
        } = &mut *state;

        let sim = streams
            .iter_mut()
            .find(|s| s.record.id == id)
            .ok_or_else(|| GatewayError::from_status(StatusCode::NOT_FOUND))?;

        if sim.record.status.is_terminal() {
            return Err(GatewayError::from_status(StatusCode::CONFLICT));
        }

        sim.record.status = StreamStatus::Stopped;
        sim.record.end_time = Some(Utc::now());
        push_activity(
            activity,
            &format!("Stream {} stopped", id),
            "Ingestion stopped by request",
            ActivityKind::Stopped,
        );

        Ok(StopStreamResponse {
            message: "Stream stopped".to_string(),
        })
    }

    async fn get_stats(&self) -> Result<IngestStats, GatewayError> {
        let state = self.lock();
        let active = state
            .streams
            .iter()
            .filter(|s| s.record.status.is_active())
            .count() as u32;

        Ok(IngestStats {
            active_streams: active,
            available_slots: self.max_concurrent.saturating_sub(active),
            max_concurrent_streams: self.max_concurrent,
            total_streams: state.streams.len() as u32,
            // Each active job holds a socket, plus the console's own
            websocket_connections: active + 1,
        })
    }

    async fn get_activity(&self) -> Vec<ApiActivity> {
        self.lock().activity.clone()
    }

    fn download_url(&self, id: &str) -> String {
        format!(
            "{}/streams/{}/download",
            SIMULATED_BASE_URL,
            urlencoding::encode(id)
        )
    }

    fn connection_status(&self) -> ConnectionStatus {
        ConnectionStatus::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lifecycle_reaches_completed() {
        let backend = SimulatedBackend::seeded(5, 42);
        let response = backend
            .start_stream("https://www.youtube.com/watch?v=abc", None)
            .await
            .unwrap();
        assert_eq!(response.stream_id, "stream-1");

        let first = backend.list_streams().await.unwrap();
        assert_eq!(first[0].status, StreamStatus::Pending);

        let mut last_status = StreamStatus::Pending;
        for _ in 0..10 {
            let streams = backend.list_streams().await.unwrap();
            last_status = streams[0].status;
            if last_status == StreamStatus::Completed {
                let record = &streams[0];
                assert_eq!(
                    record.final_mp4_path.as_deref(),
                    Some("/streams/stream-1/final.mp4")
                );
                assert!(record.end_time.is_some());
                return;
            }
        }
        panic!("stream never completed, last status {}", last_status);
    }

    #[tokio::test]
    async fn test_capacity_answers_service_unavailable() {
        let backend = SimulatedBackend::seeded(1, 7);
        backend
            .start_stream("https://twitch.tv/first", None)
            .await
            .unwrap();

        let err = backend
            .start_stream("https://twitch.tv/second", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_custom_id_conflict() {
        let backend = SimulatedBackend::seeded(5, 7);
        let response = backend
            .start_stream("https://twitch.tv/one", Some("job-a"))
            .await
            .unwrap();
        assert_eq!(response.stream_id, "job-a");

        let err = backend
            .start_stream("https://twitch.tv/two", Some("job-a"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_blank_url_rejected() {
        let backend = SimulatedBackend::seeded(5, 7);
        let err = backend.start_stream("   ", None).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_stop_unknown_and_terminal() {
        let backend = SimulatedBackend::seeded(5, 7);
        let err = backend.stop_stream("nope").await.unwrap_err();
        assert_eq!(err.status(), Some(404));

        let response = backend
            .start_stream("https://twitch.tv/chan", None)
            .await
            .unwrap();
        backend.stop_stream(&response.stream_id).await.unwrap();

        let err = backend.stop_stream(&response.stream_id).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_stats_track_active_jobs() {
        let backend = SimulatedBackend::seeded(4, 1);
        backend
            .start_stream("https://twitch.tv/a", None)
            .await
            .unwrap();
        backend
            .start_stream("https://twitch.tv/b", None)
            .await
            .unwrap();

        let stats = backend.get_stats().await.unwrap();
        assert_eq!(stats.active_streams, 2);
        assert_eq!(stats.available_slots, 2);
        assert_eq!(stats.max_concurrent_streams, 4);
        assert_eq!(stats.total_streams, 2);
        assert_eq!(stats.websocket_connections, 3);
    }

    #[tokio::test]
    async fn test_forced_failure() {
        let backend = SimulatedBackend::seeded(5, 9);
        let response = backend
            .start_stream("https://twitch.tv/chan", None)
            .await
            .unwrap();
        backend.fail_stream(&response.stream_id, "source went offline");

        let record = backend.get_stream(&response.stream_id).await.unwrap();
        assert_eq!(record.status, StreamStatus::Error);
        assert_eq!(record.error_message.as_deref(), Some("source went offline"));
        assert!(record.end_time.is_some());
    }

    #[tokio::test]
    async fn test_activity_feed_newest_first() {
        let backend = SimulatedBackend::seeded(5, 3);
        backend
            .start_stream("https://twitch.tv/a", None)
            .await
            .unwrap();
        backend
            .start_stream("https://twitch.tv/b", None)
            .await
            .unwrap();

        let activity = backend.get_activity().await;
        assert_eq!(activity.len(), 2);
        assert_eq!(activity[0].title, "Stream stream-2 started");
    }

    #[test]
    fn test_download_url() {
        let backend = SimulatedBackend::seeded(5, 3);
        assert_eq!(
            backend.download_url("stream-1"),
            "http://simulated.invalid/streams/stream-1/download"
        );
    }
}
