use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::signal;

use streamvault_console::config::{data_dir_from_env, ConsoleConfig};
use streamvault_console::context::ConsoleContext;
use streamvault_console::services::{LogEventSink, SettingsStore};

// ============================================================================
// Logging
// ============================================================================

struct ConsoleLogger {
    file: Mutex<std::fs::File>,
    level: LevelFilter,
}

impl ConsoleLogger {
    fn new(log_dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let log_path = log_dir.join("console.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self {
            file: Mutex::new(file),
            level: LevelFilter::Info,
        })
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Local::now();
        let date = timestamp.format("%Y-%m-%d");
        let time = timestamp.format("%H:%M:%S");
        let target = record.target();
        let level = record.level();
        let message = format!("{}", record.args());
        let line = format!("[{date}][{time}][{target}][{level}] {message}");

        eprintln!("{line}");
        if let Ok(mut file) = self.file.try_lock() {
            let _ = writeln!(file, "{line}");
        }
    }

    fn flush(&self) {}
}

fn init_logger(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let logger = ConsoleLogger::new(log_dir)?;
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

// ============================================================================
// Shutdown
// ============================================================================

/// Waits for Ctrl+C or SIGTERM, then stops background work
async fn shutdown_signal(context: Arc<ConsoleContext>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received, stopping services...");
    context.shutdown();
    log::info!("Console stopped");
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = data_dir_from_env();
    std::fs::create_dir_all(&data_dir)?;
    init_logger(&data_dir)?;

    let settings_store = Arc::new(SettingsStore::new(data_dir.clone()));
    let settings = settings_store.load()?;
    let config = ConsoleConfig::from_env(&settings);
    log::info!(
        "StreamVault console starting (api={}, data={}, refresh={}s)",
        config.api_url,
        data_dir.display(),
        config.refresh_period.as_secs()
    );

    let context = Arc::new(ConsoleContext::new(
        settings_store,
        &config,
        Arc::new(LogEventSink),
    )?);

    if context.gateway().health_check().await {
        log::info!("Ingestion server is reachable");
    } else {
        log::warn!("Ingestion server at {} is not responding", config.api_url);
    }

    // A simulated run seeds one job so there is something to watch
    if config.simulate {
        match context
            .registry()
            .add("https://www.youtube.com/watch?v=dQw4w9WgXcQ", Some("stream-demo-1"))
            .await
        {
            Ok(stream) => log::info!("Registered demo stream {}", stream.id),
            Err(e) => log::warn!("Could not register demo stream: {}", e),
        }
    }

    context.refresh().refresh_now().await;
    let stats = context.registry().stats().await;
    log::info!(
        "{} active of {} slots, {} streams total",
        stats.active_streams,
        stats.max_concurrent_streams,
        stats.total_streams
    );

    context.start_refresh();
    shutdown_signal(context).await;

    Ok(())
}
