//! Configuration module for logfollow.

use serde::Deserialize;
use std::path::Path;

use crate::{FollowError, Result};

/// Environment variable naming the configuration file.
pub const ENV_CONFIG_PATH: &str = "LOGFOLLOW_CONFIG";

/// Configuration file used when neither an argument nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "logfollow.toml";

/// Backend endpoints and HTTP client limits.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// URL of the cheap status query.
    #[serde(default = "default_status_url")]
    pub status_url: String,
    /// URL of the full entries query.
    #[serde(default = "default_entries_url")]
    pub entries_url: String,
    /// Connection timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds.
    #[serde(default = "default_total_timeout")]
    pub total_timeout_secs: u64,
    /// Maximum accepted response body size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_status_url() -> String {
    "http://127.0.0.1:8080/index/json_last_modified".to_string()
}

fn default_entries_url() -> String {
    "http://127.0.0.1:8080/index/json_logs".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_total_timeout() -> u64 {
    15
}

fn default_max_response_bytes() -> u64 {
    2 * 1024 * 1024 // 2MB
}

fn default_user_agent() -> String {
    concat!("logfollow/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            status_url: default_status_url(),
            entries_url: default_entries_url(),
            connect_timeout_secs: default_connect_timeout(),
            total_timeout_secs: default_total_timeout(),
            max_response_bytes: default_max_response_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

/// Poll loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FollowConfig {
    /// Initial value of the follow control flag.
    #[serde(default = "default_follow_enabled")]
    pub enabled: bool,
    /// Delay between the end of one cycle and the start of the next, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// Maximum number of entries held in the view.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Consecutive failed cycles before a stall warning is logged.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Seed cursor: last entry id already displayed.
    #[serde(default)]
    pub initial_last_id: u64,
    /// Seed cursor: last modification time already displayed (unix seconds).
    #[serde(default)]
    pub initial_last_modified: i64,
}

fn default_follow_enabled() -> bool {
    true
}

fn default_delay_ms() -> u64 {
    3000
}

fn default_max_entries() -> usize {
    25
}

fn default_max_consecutive_errors() -> u32 {
    5
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            enabled: default_follow_enabled(),
            delay_ms: default_delay_ms(),
            max_entries: default_max_entries(),
            max_consecutive_errors: default_max_consecutive_errors(),
            initial_last_id: 0,
            initial_last_modified: 0,
        }
    }
}

/// Search filter forwarded to the backend on every query.
///
/// Empty fields are not sent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FilterConfig {
    /// Environment id, or empty for all environments.
    #[serde(default)]
    pub environment: String,
    /// Host id, or empty for all hosts.
    #[serde(default)]
    pub host: String,
    /// Log source id, or empty for all sources.
    #[serde(default)]
    pub source: String,
    /// Maximum syslog priority (0 = emerg .. 7 = debug), or empty for all.
    #[serde(default)]
    pub priority: String,
    /// Full text search expression.
    #[serde(default)]
    pub search: String,
    /// Earliest log time, "YYYY-MM-DD HH:MM:SS" in backend local time.
    #[serde(default)]
    pub time_start: String,
    /// Latest log time, same format as `time_start`.
    #[serde(default)]
    pub time_end: String,
}

impl FilterConfig {
    /// Non-empty filter fields as query parameters.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("environment", self.environment.as_str()),
            ("host", self.host.as_str()),
            ("source", self.source.as_str()),
            ("priority", self.priority.as_str()),
            ("search", self.search.as_str()),
            ("time_start", self.time_start.as_str()),
            ("time_end", self.time_end.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

/// Terminal display configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Timezone used to print entry times (e.g., "UTC", "Europe/Stockholm").
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// strftime format for entry times.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_time_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            time_format: default_time_format(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional path to a log file, written in addition to stderr.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Poll loop configuration.
    #[serde(default)]
    pub follow: FollowConfig,
    /// Search filter.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Display configuration.
    #[serde(default)]
    pub display: DisplayConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FollowError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FollowError::Config(format!("config parse error: {e}")))
    }

    /// Resolve the configuration path from an optional CLI argument.
    ///
    /// The argument wins, then `LOGFOLLOW_CONFIG`, then [`DEFAULT_CONFIG_PATH`].
    pub fn resolve_path(arg: Option<String>) -> String {
        arg.or_else(|| std::env::var(ENV_CONFIG_PATH).ok().filter(|p| !p.is_empty()))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `LOGFOLLOW_STATUS_URL`: Override the status query URL
    /// - `LOGFOLLOW_ENTRIES_URL`: Override the entries query URL
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LOGFOLLOW_STATUS_URL") {
            if !url.is_empty() {
                self.feed.status_url = url;
            }
        }
        if let Ok(url) = std::env::var("LOGFOLLOW_ENTRIES_URL") {
            if !url.is_empty() {
                self.feed.entries_url = url;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.feed.status_url)?;
        validate_url(&self.feed.entries_url)?;

        if self.follow.delay_ms == 0 {
            return Err(FollowError::Validation(
                "follow.delay_ms must be at least 1".to_string(),
            ));
        }
        if self.follow.max_entries == 0 {
            return Err(FollowError::Validation(
                "follow.max_entries must be at least 1".to_string(),
            ));
        }
        if self.display.timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(FollowError::Validation(format!(
                "unknown timezone: {}",
                self.display.timezone
            )));
        }
        Ok(())
    }
}

/// Check that a URL parses and uses http or https.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)
        .map_err(|e| FollowError::Validation(format!("invalid URL {url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(FollowError::Validation(format!(
            "unsupported URL scheme: {scheme}"
        ))),
    }
}
