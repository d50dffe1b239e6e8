// Refresh Service
// Periodically pulls server state and reconciles the local registry

use crate::services::gateway::{ApiActivity, IngestGateway};
use crate::services::registry::StreamRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

/// How often the server is polled unless configured otherwise
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Background loop that keeps the registry in step with the server. Each
/// pass pulls stats and the stream list, hands both to the registry, and
/// caches the server-side activity feed. A failed pass logs and waits for
/// the next tick; it never touches local state.
pub struct RefreshService {
    registry: Arc<StreamRegistry>,
    gateway: Arc<dyn IngestGateway>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    remote_activity: Arc<RwLock<Vec<ApiActivity>>>,
}

impl RefreshService {
    pub fn new(registry: Arc<StreamRegistry>, gateway: Arc<dyn IngestGateway>) -> Self {
        Self {
            registry,
            gateway,
            running: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            remote_activity: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Run one refresh pass immediately
    pub async fn refresh_now(&self) {
        refresh_once(&self.registry, self.gateway.as_ref(), &self.remote_activity).await;
    }

    /// Most recent server-side activity feed, newest first
    pub fn remote_activity(&self) -> Vec<ApiActivity> {
        self.remote_activity
            .read()
            .map(|cache| cache.clone())
            .unwrap_or_default()
    }

    /// Start the polling loop. The first pass runs right away, later
    /// passes follow the period. Calling start on a running service does
    /// nothing.
    pub fn start(&self, period: Duration) {
        if self.running.swap(true, Ordering::Relaxed) {
            log::debug!("RefreshService already running");
            return;
        }

        let running = self.running.clone();
        let registry = self.registry.clone();
        let gateway = self.gateway.clone();
        let remote_activity = self.remote_activity.clone();

        let handle = tokio::spawn(async move {
            log::info!("Refresh loop started ({}s period)", period.as_secs());
            let mut ticker = interval(period);

            while running.load(Ordering::Relaxed) {
                ticker.tick().await;
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                refresh_once(&registry, gateway.as_ref(), &remote_activity).await;
            }
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }
    }

    /// Stop the polling loop. A pass already in flight is cancelled.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        if let Ok(mut slot) = self.handle.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

async fn refresh_once(
    registry: &StreamRegistry,
    gateway: &dyn IngestGateway,
    remote_activity: &RwLock<Vec<ApiActivity>>,
) {
    let stats = match gateway.get_stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            log::warn!("Stats refresh failed: {}", e);
            None
        }
    };

    match gateway.list_streams().await {
        Ok(streams) => registry.apply_snapshot(streams, stats.as_ref()).await,
        Err(e) => {
            log::warn!("Stream refresh failed: {}", e);
            // Counters can still be adopted when only the list call failed
            if let Some(ref stats) = stats {
                registry.apply_server_stats(stats).await;
            }
        }
    }

    let activity = gateway.get_activity().await;
    if let Ok(mut cache) = remote_activity.write() {
        *cache = activity;
    }
}
