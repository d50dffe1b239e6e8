// Console Settings Model
// Nested configuration groups persisted client-side

use serde::{Deserialize, Serialize};
use super::Quality;

// ============================================================================
// Default value functions
// ============================================================================

fn default_quality() -> Quality {
    Quality::Q1080
}

fn default_fps() -> u32 {
    30
}

fn default_bitrate_kbps() -> u32 {
    4500
}

fn default_record_streams() -> bool {
    true
}

fn default_max_concurrent_streams() -> u32 {
    5
}

fn default_push() -> bool {
    true
}

fn default_desktop() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_api_endpoint() -> String {
    "http://localhost:3001".to_string()
}

fn default_buffer_size_kb() -> u32 {
    1024
}

// ============================================================================
// Enumerated choices
// ============================================================================

/// Chat moderation strictness applied to ingested streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// UI color scheme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system preference
    #[default]
    System,
}

// ============================================================================
// Streaming Settings
// ============================================================================

/// Defaults applied to newly registered streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingSettings {
    /// Rendition requested for new ingests
    #[serde(default = "default_quality")]
    pub default_quality: Quality,

    /// Target frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Target bitrate in kilobits per second
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: u32,

    /// Begin ingesting as soon as a source is registered
    #[serde(default)]
    pub auto_start: bool,

    /// Keep the final MP4 after ingestion finishes
    #[serde(default = "default_record_streams")]
    pub record_streams: bool,

    /// Client-side slot limit; superseded once the server reports its own
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: u32,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            default_quality: default_quality(),
            fps: default_fps(),
            bitrate_kbps: default_bitrate_kbps(),
            auto_start: false,
            record_streams: default_record_streams(),
            max_concurrent_streams: default_max_concurrent_streams(),
        }
    }
}

// ============================================================================
// Notification Settings
// ============================================================================

/// Channels used to announce lifecycle changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// Send a summary email per finished stream
    #[serde(default)]
    pub email: bool,

    /// Push notifications to registered devices
    #[serde(default = "default_push")]
    pub push: bool,

    /// Desktop notifications while the console is open
    #[serde(default = "default_desktop")]
    pub desktop: bool,

    /// Audible cue on status changes
    #[serde(default)]
    pub sound: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: false,
            push: default_push(),
            desktop: default_desktop(),
            sound: false,
        }
    }
}

// ============================================================================
// Security Settings
// ============================================================================

/// Credentials and moderation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    /// Key presented to the ingestion server
    #[serde(default)]
    pub stream_key: String,

    /// Moderation strictness
    #[serde(default)]
    pub moderation_level: ModerationLevel,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            stream_key: String::new(),
            moderation_level: ModerationLevel::default(),
        }
    }
}

// ============================================================================
// Appearance Settings
// ============================================================================

/// Display preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceSettings {
    #[serde(default)]
    pub theme: Theme,

    /// Language code
    #[serde(default = "default_language")]
    pub language: String,

    /// IANA timezone name used for timestamps
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: default_language(),
            timezone: default_timezone(),
        }
    }
}

// ============================================================================
// Advanced Settings
// ============================================================================

/// Connection and tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSettings {
    /// Base URL of the ingestion API
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Webhook invoked on terminal transitions, disabled when empty
    #[serde(default)]
    pub webhook_url: String,

    /// Read buffer size for ingest downloads
    #[serde(default = "default_buffer_size_kb")]
    pub buffer_size_kb: u32,
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            api_endpoint: default_api_endpoint(),
            webhook_url: String::new(),
            buffer_size_kb: default_buffer_size_kb(),
        }
    }
}

// ============================================================================
// Console Settings (combines all groups)
// ============================================================================

/// Complete client-side configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSettings {
    #[serde(default)]
    pub streaming: StreamingSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub security: SecuritySettings,

    #[serde(default)]
    pub appearance: AppearanceSettings,

    #[serde(default)]
    pub advanced: AdvancedSettings,
}

// ============================================================================
// Partial updates
// ============================================================================

/// Partial update for one settings group; `None` fields keep their value.
/// Applying returns true when anything actually changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingPatch {
    pub default_quality: Option<Quality>,
    pub fps: Option<u32>,
    pub bitrate_kbps: Option<u32>,
    pub auto_start: Option<bool>,
    pub record_streams: Option<bool>,
    pub max_concurrent_streams: Option<u32>,
}

impl StreamingPatch {
    pub fn apply(&self, settings: &mut StreamingSettings) -> bool {
        let mut changed = false;

        if let Some(value) = self.default_quality {
            if settings.default_quality != value {
                settings.default_quality = value;
                changed = true;
            }
        }
        if let Some(value) = self.fps {
            if settings.fps != value {
                settings.fps = value;
                changed = true;
            }
        }
        if let Some(value) = self.bitrate_kbps {
            if settings.bitrate_kbps != value {
                settings.bitrate_kbps = value;
                changed = true;
            }
        }
        if let Some(value) = self.auto_start {
            if settings.auto_start != value {
                settings.auto_start = value;
                changed = true;
            }
        }
        if let Some(value) = self.record_streams {
            if settings.record_streams != value {
                settings.record_streams = value;
                changed = true;
            }
        }
        if let Some(value) = self.max_concurrent_streams {
            if settings.max_concurrent_streams != value {
                settings.max_concurrent_streams = value;
                changed = true;
            }
        }

        changed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPatch {
    pub email: Option<bool>,
    pub push: Option<bool>,
    pub desktop: Option<bool>,
    pub sound: Option<bool>,
}

impl NotificationPatch {
    pub fn apply(&self, settings: &mut NotificationSettings) -> bool {
        let mut changed = false;

        if let Some(value) = self.email {
            if settings.email != value {
                settings.email = value;
                changed = true;
            }
        }
        if let Some(value) = self.push {
            if settings.push != value {
                settings.push = value;
                changed = true;
            }
        }
        if let Some(value) = self.desktop {
            if settings.desktop != value {
                settings.desktop = value;
                changed = true;
            }
        }
        if let Some(value) = self.sound {
            if settings.sound != value {
                settings.sound = value;
                changed = true;
            }
        }

        changed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityPatch {
    pub stream_key: Option<String>,
    pub moderation_level: Option<ModerationLevel>,
}

impl SecurityPatch {
    pub fn apply(&self, settings: &mut SecuritySettings) -> bool {
        let mut changed = false;

        if let Some(ref value) = self.stream_key {
            if settings.stream_key != *value {
                settings.stream_key = value.clone();
                changed = true;
            }
        }
        if let Some(value) = self.moderation_level {
            if settings.moderation_level != value {
                settings.moderation_level = value;
                changed = true;
            }
        }

        changed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearancePatch {
    pub theme: Option<Theme>,
    pub language: Option<String>,
    pub timezone: Option<String>,
}

impl AppearancePatch {
    pub fn apply(&self, settings: &mut AppearanceSettings) -> bool {
        let mut changed = false;

        if let Some(value) = self.theme {
            if settings.theme != value {
                settings.theme = value;
                changed = true;
            }
        }
        if let Some(ref value) = self.language {
            if settings.language != *value {
                settings.language = value.clone();
                changed = true;
            }
        }
        if let Some(ref value) = self.timezone {
            if settings.timezone != *value {
                settings.timezone = value.clone();
                changed = true;
            }
        }

        changed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedPatch {
    pub api_endpoint: Option<String>,
    pub webhook_url: Option<String>,
    pub buffer_size_kb: Option<u32>,
}

impl AdvancedPatch {
    pub fn apply(&self, settings: &mut AdvancedSettings) -> bool {
        let mut changed = false;

        if let Some(ref value) = self.api_endpoint {
            if settings.api_endpoint != *value {
                settings.api_endpoint = value.clone();
                changed = true;
            }
        }
        if let Some(ref value) = self.webhook_url {
            if settings.webhook_url != *value {
                settings.webhook_url = value.clone();
                changed = true;
            }
        }
        if let Some(value) = self.buffer_size_kb {
            if settings.buffer_size_kb != value {
                settings.buffer_size_kb = value;
                changed = true;
            }
        }

        changed
    }
}

/// Partial update spanning any subset of the settings groups.
/// Groups left as `None` are untouched; within a present group, only the
/// present fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub streaming: Option<StreamingPatch>,
    pub notifications: Option<NotificationPatch>,
    pub security: Option<SecurityPatch>,
    pub appearance: Option<AppearancePatch>,
    pub advanced: Option<AdvancedPatch>,
}

impl SettingsPatch {
    /// Apply every present group, returning true when anything changed
    pub fn apply(&self, settings: &mut ConsoleSettings) -> bool {
        let mut changed = false;

        if let Some(ref patch) = self.streaming {
            changed |= patch.apply(&mut settings.streaming);
        }
        if let Some(ref patch) = self.notifications {
            changed |= patch.apply(&mut settings.notifications);
        }
        if let Some(ref patch) = self.security {
            changed |= patch.apply(&mut settings.security);
        }
        if let Some(ref patch) = self.appearance {
            changed |= patch.apply(&mut settings.appearance);
        }
        if let Some(ref patch) = self.advanced {
            changed |= patch.apply(&mut settings.advanced);
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ConsoleSettings::default();
        assert_eq!(settings.streaming.default_quality, Quality::Q1080);
        assert_eq!(settings.streaming.fps, 30);
        assert_eq!(settings.streaming.max_concurrent_streams, 5);
        assert!(!settings.notifications.email);
        assert!(settings.notifications.push);
        assert_eq!(settings.security.moderation_level, ModerationLevel::Medium);
        assert_eq!(settings.appearance.theme, Theme::System);
        assert_eq!(settings.advanced.api_endpoint, "http://localhost:3001");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        // A file written by an older build only knows some groups
        let json = r#"{"streaming":{"fps":60},"appearance":{"theme":"dark"}}"#;
        let settings: ConsoleSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.streaming.fps, 60);
        assert_eq!(settings.streaming.default_quality, Quality::Q1080);
        assert_eq!(settings.appearance.theme, Theme::Dark);
        assert_eq!(settings.appearance.language, "en");
        assert_eq!(settings.advanced.buffer_size_kb, 1024);
    }

    #[test]
    fn test_patch_touches_only_named_fields() {
        let mut settings = ConsoleSettings::default();
        let patch = SettingsPatch {
            notifications: Some(NotificationPatch {
                email: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(patch.apply(&mut settings));

        assert!(settings.notifications.email);
        // Sibling fields and sibling groups are untouched
        assert!(settings.notifications.push);
        assert!(settings.notifications.desktop);
        assert_eq!(settings.streaming, StreamingSettings::default());
        assert_eq!(settings.security, SecuritySettings::default());
    }

    #[test]
    fn test_patch_reports_no_change_for_same_values() {
        let mut settings = ConsoleSettings::default();
        let patch = SettingsPatch {
            streaming: Some(StreamingPatch {
                fps: Some(30),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert!(!patch.apply(&mut settings));
        assert_eq!(settings, ConsoleSettings::default());
    }

    #[test]
    fn test_patch_deserializes_from_camel_case() {
        let json = r#"{"streaming":{"maxConcurrentStreams":8},"advanced":{"apiEndpoint":"http://ingest.example.com"}}"#;
        let patch: SettingsPatch = serde_json::from_str(json).unwrap();

        let mut settings = ConsoleSettings::default();
        assert!(patch.apply(&mut settings));
        assert_eq!(settings.streaming.max_concurrent_streams, 8);
        assert_eq!(settings.advanced.api_endpoint, "http://ingest.example.com");
    }

    #[test]
    fn test_settings_round_trip() {
        let mut settings = ConsoleSettings::default();
        settings.streaming.default_quality = Quality::Q720;
        settings.security.stream_key = "sk-demo".to_string();

        let json = serde_json::to_string_pretty(&settings).unwrap();
        let restored: ConsoleSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
