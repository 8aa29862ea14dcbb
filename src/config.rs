use crate::domain::{default_patterns, validate_patterns, Pattern};
use chrono::FixedOffset;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub scoreboard: ScoreboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Endpoint returning the latest round
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,
}

fn default_feed_url() -> String {
    "https://api-cs.casino.org/svc-evolution-game-events/api/bacbo/latest".to_string()
}

fn default_feed_timeout() -> u64 {
    10
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_secs: default_feed_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,
    /// Channel or chat id messages are posted to
    pub chat_id: String,
    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Request timeout in seconds
    #[serde(default = "default_telegram_timeout")]
    pub timeout_secs: u64,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_telegram_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between feed polls
    #[serde(default = "default_feed_poll_secs")]
    pub feed_poll_secs: u64,
    /// Seconds between signal attempts
    #[serde(default = "default_signal_interval_secs")]
    pub signal_interval_secs: u64,
    /// Delay before the first signal attempt
    #[serde(default = "default_signal_start_delay_secs")]
    pub signal_start_delay_secs: u64,
    /// Seconds before the idle placeholder is reposted
    #[serde(default = "default_placeholder_refresh_secs")]
    pub placeholder_refresh_secs: u64,
    /// Sleep after a failed feed tick
    #[serde(default = "default_feed_error_backoff_secs")]
    pub feed_error_backoff_secs: u64,
    /// Sleep after a failed signal tick
    #[serde(default = "default_signal_error_backoff_secs")]
    pub signal_error_backoff_secs: u64,
}

fn default_feed_poll_secs() -> u64 {
    3
}

fn default_signal_interval_secs() -> u64 {
    5
}

fn default_signal_start_delay_secs() -> u64 {
    2
}

fn default_placeholder_refresh_secs() -> u64 {
    120
}

fn default_feed_error_backoff_secs() -> u64 {
    5
}

fn default_signal_error_backoff_secs() -> u64 {
    2
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            feed_poll_secs: default_feed_poll_secs(),
            signal_interval_secs: default_signal_interval_secs(),
            signal_start_delay_secs: default_signal_start_delay_secs(),
            placeholder_refresh_secs: default_placeholder_refresh_secs(),
            feed_error_backoff_secs: default_feed_error_backoff_secs(),
            signal_error_backoff_secs: default_signal_error_backoff_secs(),
        }
    }
}

impl SchedulerConfig {
    pub fn feed_poll(&self) -> Duration {
        Duration::from_secs(self.feed_poll_secs)
    }

    pub fn signal_interval(&self) -> Duration {
        Duration::from_secs(self.signal_interval_secs)
    }

    pub fn signal_start_delay(&self) -> Duration {
        Duration::from_secs(self.signal_start_delay_secs)
    }

    pub fn placeholder_refresh(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.placeholder_refresh_secs as i64)
    }

    pub fn feed_error_backoff(&self) -> Duration {
        Duration::from_secs(self.feed_error_backoff_secs)
    }

    pub fn signal_error_backoff(&self) -> Duration {
        Duration::from_secs(self.signal_error_backoff_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalConfig {
    /// Rounds required before any pattern is tried
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    /// Maximum rounds kept in history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Patterns in priority order
    #[serde(default = "default_patterns")]
    pub patterns: Vec<Pattern>,
}

fn default_min_history() -> usize {
    5
}

fn default_history_capacity() -> usize {
    200
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            min_history: default_min_history(),
            history_capacity: default_history_capacity(),
            patterns: default_patterns(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardConfig {
    /// Offset from UTC used for the daily reset, in minutes (default WAT, UTC+1)
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

fn default_utc_offset_minutes() -> i32 {
    60
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl ScoreboardConfig {
    pub fn offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("telegram.api_base", default_telegram_api_base())?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("SIGNALBOT_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (SIGNALBOT_TELEGRAM__BOT_TOKEN, etc.)
            .add_source(
                Environment::with_prefix("SIGNALBOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration for the given credentials
    pub fn default_config(bot_token: &str, chat_id: &str) -> Self {
        Self {
            feed: FeedConfig::default(),
            telegram: TelegramConfig {
                bot_token: bot_token.to_string(),
                chat_id: chat_id.to_string(),
                api_base: default_telegram_api_base(),
                timeout_secs: default_telegram_timeout(),
            },
            scheduler: SchedulerConfig::default(),
            signal: SignalConfig::default(),
            scoreboard: ScoreboardConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        // Credentials
        if self.telegram.bot_token.trim().is_empty() {
            errors.push("telegram.bot_token must be set".to_string());
        }
        if self.telegram.chat_id.trim().is_empty() {
            errors.push("telegram.chat_id must be set".to_string());
        }
        if self.feed.url.trim().is_empty() {
            errors.push("feed.url must be set".to_string());
        }

        // Intervals
        let intervals = [
            ("scheduler.feed_poll_secs", self.scheduler.feed_poll_secs),
            ("scheduler.signal_interval_secs", self.scheduler.signal_interval_secs),
            (
                "scheduler.placeholder_refresh_secs",
                self.scheduler.placeholder_refresh_secs,
            ),
            ("feed.timeout_secs", self.feed.timeout_secs),
            ("telegram.timeout_secs", self.telegram.timeout_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                errors.push(format!("{name} must be positive"));
            }
        }

        // History
        if self.signal.history_capacity == 0 {
            errors.push("signal.history_capacity must be positive".to_string());
        }
        if self.signal.min_history > self.signal.history_capacity {
            errors.push(format!(
                "signal.min_history ({}) cannot exceed signal.history_capacity ({})",
                self.signal.min_history, self.signal.history_capacity
            ));
        }
        if let Some(longest) = self.signal.patterns.iter().map(Pattern::len).max() {
            if longest > self.signal.history_capacity {
                errors.push(format!(
                    "longest pattern ({longest}) cannot exceed signal.history_capacity ({})",
                    self.signal.history_capacity
                ));
            }
        }

        errors.extend(validate_patterns(&self.signal.patterns));

        if self.scoreboard.offset().is_none() {
            errors.push(format!(
                "scoreboard.utc_offset_minutes out of range: {}",
                self.scoreboard.utc_offset_minutes
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
