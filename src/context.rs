// Console Context
// Wires the services together behind one explicit handle

use crate::config::ConsoleConfig;
use crate::models::{ConsoleSettings, SettingsPatch, View};
use crate::services::{
    ActivityLog, ConnectionStatus, EventSink, HttpGateway, IngestGateway, RefreshService,
    SettingsError, SettingsStore, SimulatedBackend, StreamRegistry,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Owns every long-lived service of the console. Callers hold one of
/// these instead of reaching for globals; everything the UI needs hangs
/// off it.
pub struct ConsoleContext {
    settings_store: Arc<SettingsStore>,
    gateway: Arc<dyn IngestGateway>,
    activity: Arc<ActivityLog>,
    registry: Arc<StreamRegistry>,
    refresh: RefreshService,
    view: RwLock<View>,
    refresh_period: Duration,
}

impl ConsoleContext {
    /// Build the full service graph. The backend choice (real server or
    /// in-process simulation) is made once here and never changes.
    pub fn new(
        settings_store: Arc<SettingsStore>,
        config: &ConsoleConfig,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, SettingsError> {
        let settings = settings_store.load()?;

        let gateway: Arc<dyn IngestGateway> = if config.simulate {
            log::info!("Using the simulated backend");
            Arc::new(SimulatedBackend::new(
                settings.streaming.max_concurrent_streams,
            ))
        } else {
            Arc::new(HttpGateway::with_url(config.api_url.clone()))
        };

        let activity = Arc::new(ActivityLog::new());
        let registry = Arc::new(StreamRegistry::new(
            gateway.clone(),
            activity.clone(),
            events,
            settings.streaming.max_concurrent_streams,
            settings.streaming.default_quality,
        ));
        let refresh = RefreshService::new(registry.clone(), gateway.clone());

        Ok(Self {
            settings_store,
            gateway,
            activity,
            registry,
            refresh,
            view: RwLock::new(View::default()),
            refresh_period: config.refresh_period,
        })
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn refresh(&self) -> &RefreshService {
        &self.refresh
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn gateway(&self) -> &dyn IngestGateway {
        self.gateway.as_ref()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.gateway.connection_status()
    }

    /// Settings currently in effect
    pub fn settings(&self) -> Result<ConsoleSettings, SettingsError> {
        self.settings_store.load()
    }

    /// Apply a partial settings update and persist it. Registry knobs
    /// backed by settings pick the change up immediately.
    pub async fn update_settings(
        &self,
        patch: &SettingsPatch,
    ) -> Result<ConsoleSettings, SettingsError> {
        let settings = self.settings_store.update(patch)?;
        self.push_settings_to_registry(&settings).await;
        Ok(settings)
    }

    /// Reset settings to defaults and clear the persisted file
    pub async fn reset_settings(&self) -> Result<ConsoleSettings, SettingsError> {
        let settings = self.settings_store.reset()?;
        self.push_settings_to_registry(&settings).await;
        log::info!("Settings reset to defaults");
        Ok(settings)
    }

    async fn push_settings_to_registry(&self, settings: &ConsoleSettings) {
        self.registry
            .set_local_max(settings.streaming.max_concurrent_streams)
            .await;
        self.registry
            .set_default_quality(settings.streaming.default_quality)
            .await;
    }

    /// Screen the console is showing
    pub fn current_view(&self) -> View {
        *self.view.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Switch screens. Stream and settings state are untouched.
    pub fn set_view(&self, view: View) {
        let mut current = self.view.write().unwrap_or_else(|e| e.into_inner());
        if *current != view {
            log::debug!("View changed to {}", view);
            *current = view;
        }
    }

    /// Start background polling with the configured period
    pub fn start_refresh(&self) {
        self.refresh.start(self.refresh_period);
    }

    /// Stop background work. Safe to call more than once.
    pub fn shutdown(&self) {
        self.refresh.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quality, StreamingPatch};
    use crate::services::{NoopEventSink, DEFAULT_API_URL};

    fn simulated_context(dir: &std::path::Path) -> ConsoleContext {
        let config = ConsoleConfig {
            api_url: DEFAULT_API_URL.to_string(),
            refresh_period: Duration::from_secs(60),
            simulate: true,
        };
        let store = Arc::new(SettingsStore::new(dir.to_path_buf()));
        ConsoleContext::new(store, &config, Arc::new(NoopEventSink)).unwrap()
    }

    #[tokio::test]
    async fn test_streams_flow_through_context() {
        let dir = tempfile::tempdir().unwrap();
        let context = simulated_context(dir.path());

        let stream = context
            .registry()
            .add("https://www.youtube.com/watch?v=abc", None)
            .await
            .unwrap();
        assert_eq!(stream.platform, "youtube.com");
        assert_eq!(context.registry().stats().await.active_streams, 1);
        assert_eq!(context.connection_status(), ConnectionStatus::Connected);
    }

    #[tokio::test]
    async fn test_settings_update_reaches_registry() {
        let dir = tempfile::tempdir().unwrap();
        let context = simulated_context(dir.path());

        let patch = SettingsPatch {
            streaming: Some(StreamingPatch {
                max_concurrent_streams: Some(2),
                default_quality: Some(Quality::Q720),
                ..Default::default()
            }),
            ..Default::default()
        };
        let settings = context.update_settings(&patch).await.unwrap();
        assert_eq!(settings.streaming.max_concurrent_streams, 2);

        let stats = context.registry().stats().await;
        assert_eq!(stats.max_concurrent_streams, 2);

        let stream = context
            .registry()
            .add("https://twitch.tv/chan", None)
            .await
            .unwrap();
        assert_eq!(stream.current_quality, Quality::Q720);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let context = simulated_context(dir.path());

        let patch = SettingsPatch {
            streaming: Some(StreamingPatch {
                fps: Some(60),
                ..Default::default()
            }),
            ..Default::default()
        };
        context.update_settings(&patch).await.unwrap();

        let settings = context.reset_settings().await.unwrap();
        assert_eq!(settings, ConsoleSettings::default());
        assert_eq!(context.settings().unwrap(), ConsoleSettings::default());
    }

    #[tokio::test]
    async fn test_view_switching() {
        let dir = tempfile::tempdir().unwrap();
        let context = simulated_context(dir.path());

        assert_eq!(context.current_view(), View::Dashboard);
        context.set_view(View::Settings);
        assert_eq!(context.current_view(), View::Settings);
        // Switching screens leaves data alone
        assert!(context.registry().list().await.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_stops_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let context = simulated_context(dir.path());

        context.start_refresh();
        assert!(context.refresh().is_running());
        context.shutdown();
        assert!(!context.refresh().is_running());
        context.shutdown();
    }
}
