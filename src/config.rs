//! Configuration System
//!
//! Settings come from a TOML file, then `VITALWATCH_*` environment variables
//! win over whatever the file says.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::client::ApiClientConfig;
use crate::channel::{PushConfig, ReconnectPolicy};
use crate::chart::TimeRange;
use crate::dashboard::DashboardSettings;

/// Everything the native client can be configured with
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub push: PushSettings,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend REST API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_url() -> String {
    crate::api::DEFAULT_API_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ApiClientConfig {
        ApiClientConfig {
            base_url: self.base_url.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

/// Push channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PushSettings {
    /// Socket.IO server root
    #[serde(default = "default_push_url")]
    pub url: String,

    #[serde(default = "default_push_enabled")]
    pub enabled: bool,

    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,

    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_ms: u64,

    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
}

fn default_push_url() -> String {
    "http://localhost:5001".to_string()
}

fn default_push_enabled() -> bool {
    true
}

fn default_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base() -> u64 {
    1000
}

fn default_reconnect_max() -> u64 {
    30_000
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            url: default_push_url(),
            enabled: default_push_enabled(),
            reconnect_attempts: default_reconnect_attempts(),
            reconnect_base_ms: default_reconnect_base(),
            reconnect_max_ms: default_reconnect_max(),
        }
    }
}

impl PushSettings {
    pub fn channel_config(&self, request_timeout_secs: u64) -> PushConfig {
        PushConfig {
            url: self.url.clone(),
            reconnect: ReconnectPolicy {
                max_attempts: self.reconnect_attempts,
                base_delay_ms: self.reconnect_base_ms,
                max_delay_ms: self.reconnect_max_ms,
            },
            request_timeout: Duration::from_secs(request_timeout_secs.max(1)),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_live_points")]
    pub live_points: usize,

    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,

    #[serde(default)]
    pub default_range: TimeRange,
}

fn default_poll_interval() -> u64 {
    30
}

fn default_live_points() -> usize {
    crate::chart::LIVE_CHART_CAPACITY
}

fn default_max_alerts() -> usize {
    crate::alerts::MAX_ALERTS
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            live_points: default_live_points(),
            max_alerts: default_max_alerts(),
            default_range: TimeRange::default(),
        }
    }
}

impl DashboardConfig {
    pub fn settings(&self) -> DashboardSettings {
        DashboardSettings {
            live_points: self.live_points,
            max_alerts: self.max_alerts,
            default_range: self.default_range,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Local session storage
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("vitalwatch").to_string_lossy().to_string())
        .unwrap_or_else(|| "./vitalwatch_data".to_string())
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl SessionConfig {
    /// Data directory with a leading `~` expanded
    pub fn data_path(&self) -> PathBuf {
        match self.data_dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.data_dir)),
            None => PathBuf::from(&self.data_dir),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Read and parse one TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Defaults plus environment overrides, no file
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// File first, then environment overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// First readable file among the user config dir, `/etc` and the
    /// working directory; falls back to [`Config::from_env`]
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("vitalwatch").join("config.toml")),
            Some(PathBuf::from("/etc/vitalwatch/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `VITALWATCH_*` overrides from any variable source
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("VITALWATCH_API_URL") {
            self.api.base_url = url;
        }
        if let Some(url) = var("VITALWATCH_PUSH_URL") {
            self.push.url = url;
        }
        if let Some(data_dir) = var("VITALWATCH_DATA_DIR") {
            self.session.data_dir = data_dir;
        }
        if let Some(secs) = var("VITALWATCH_POLL_INTERVAL_SECS") {
            match secs.parse() {
                Ok(secs) => self.dashboard.poll_interval_secs = secs,
                Err(_) => tracing::warn!("Ignoring invalid VITALWATCH_POLL_INTERVAL_SECS: {}", secs),
            }
        }
        if let Some(level) = var("VITALWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("VITALWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Commented TOML written by `vitalwatch config`
pub fn generate_default_config() -> String {
    r#"# VitalWatch Configuration
#
# Environment variables override these settings:
# - VITALWATCH_API_URL
# - VITALWATCH_PUSH_URL
# - VITALWATCH_DATA_DIR
# - VITALWATCH_POLL_INTERVAL_SECS
# - VITALWATCH_LOG_LEVEL
# - VITALWATCH_LOG_FORMAT

[api]
# Backend REST API, including the /api prefix
base_url = "http://localhost:5001/api"

# Request timeout in seconds
request_timeout_secs = 30

[push]
# Socket.IO server for real-time updates
url = "http://localhost:5001"

# Set to false to rely on polling only
enabled = true

# Reconnect attempts before giving up
reconnect_attempts = 5

# First reconnect delay; doubles each attempt up to reconnect_max_ms
reconnect_base_ms = 1000
reconnect_max_ms = 30000

[dashboard]
# Poll fallback period while a device is linked
poll_interval_secs = 30

# Points kept on the live chart
live_points = 20

# Alerts kept on screen
max_alerts = 5

# History window: 1h, 6h, 24h or 7d
default_range = "24h"

[session]
# Where the login session is stored
data_dir = "~/.local/share/vitalwatch"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:5001/api");
        assert_eq!(config.push.reconnect_attempts, 5);
        assert_eq!(config.dashboard.poll_interval_secs, 30);
        assert_eq!(config.dashboard.default_range, TimeRange::Day);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[dashboard]\ndefault_range = \"7d\"\n").unwrap();
        assert_eq!(config.dashboard.default_range, TimeRange::Week);
        assert_eq!(config.dashboard.live_points, 20);
        assert!(config.push.enabled);
        assert_eq!(config.api.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(Config::parse("[dashboard]\ndefault_range = \"2d\"\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VITALWATCH_API_URL", "https://vitals.example/api"),
            ("VITALWATCH_POLL_INTERVAL_SECS", "not-a-number"),
            ("VITALWATCH_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.api.base_url, "https://vitals.example/api");
        assert_eq!(config.dashboard.poll_interval_secs, 30);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_push_channel_config() {
        let push = PushSettings::default().channel_config(10);
        assert_eq!(push.reconnect, ReconnectPolicy::default());
        assert_eq!(push.request_timeout, Duration::from_secs(10));
    }
}
