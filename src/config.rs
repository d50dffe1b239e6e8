// Console Configuration
// Environment variables win over settings, settings win over defaults

use crate::models::ConsoleSettings;
use crate::services::{DEFAULT_API_URL, DEFAULT_REFRESH_SECS};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration resolved at startup
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Base URL of the ingestion API
    pub api_url: String,
    /// Poll period for the refresh loop
    pub refresh_period: Duration,
    /// Run against the in-process simulated backend instead of a server
    pub simulate: bool,
}

impl ConsoleConfig {
    /// Resolve configuration from the process environment and the loaded
    /// settings
    pub fn from_env(settings: &ConsoleSettings) -> Self {
        Self::resolve(
            env::var("STREAMVAULT_API_URL").ok(),
            env::var("STREAMVAULT_REFRESH_SECS").ok(),
            env::var("STREAMVAULT_SIMULATE").ok(),
            settings,
        )
    }

    fn resolve(
        api_url: Option<String>,
        refresh_secs: Option<String>,
        simulate: Option<String>,
        settings: &ConsoleSettings,
    ) -> Self {
        let env_api_url = api_url.and_then(|value| {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        });
        let settings_api_url = {
            let trimmed = settings.advanced.api_endpoint.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        };
        let api_url = env_api_url
            .or(settings_api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let refresh_secs = refresh_secs
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REFRESH_SECS);

        let simulate = simulate
            .and_then(|value| parse_bool(&value))
            .unwrap_or(false);

        Self {
            api_url,
            refresh_period: Duration::from_secs(refresh_secs),
            simulate,
        }
    }
}

/// Directory holding settings and logs. Resolved before settings load, so
/// only the environment and the platform default apply.
pub fn data_dir_from_env() -> PathBuf {
    data_dir_from(env::var("STREAMVAULT_DATA_DIR").ok())
}

fn data_dir_from(value: Option<String>) -> PathBuf {
    match value {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => default_data_dir(),
    }
}

fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .map(|dir| dir.join("streamvault-console"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
