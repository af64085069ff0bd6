//! Configuration module for newsdigest.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::{DigestError, Result};

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Empty disables the chat bot and scheduled delivery.
    #[serde(default)]
    pub token: String,
    /// Bot API base URL.
    #[serde(default = "default_telegram_api_url")]
    pub api_url: String,
    /// Long-poll timeout for `getUpdates` in seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Maximum characters per outgoing message.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_max_message_length() -> usize {
    4096
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_telegram_api_url(),
            poll_timeout_secs: default_poll_timeout(),
            max_message_length: default_max_message_length(),
        }
    }
}

impl TelegramConfig {
    /// Whether a bot token is configured.
    pub fn is_configured(&self) -> bool {
        !self.token.trim().is_empty()
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/newsdigest.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/newsdigest.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// A topic in the news catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicConfig {
    /// Stable key used in user settings and the HTTP API.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Search query sent to the news source.
    pub query: String,
}

impl TopicConfig {
    fn new(key: &str, label: &str, query: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            query: query.to_string(),
        }
    }
}

/// News source configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// Per-request feed timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Wall-clock budget for one fetch across all sources, in seconds.
    #[serde(default = "default_max_fetch_duration")]
    pub max_fetch_duration_secs: u64,
    /// Maximum items collected across all sources in one fetch.
    #[serde(default = "default_max_items_total")]
    pub max_items_total: usize,
    /// Matching items taken per source for on-demand digests.
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
    /// Matching items taken per source for scheduled digests.
    #[serde(default = "default_auto_per_feed_limit")]
    pub auto_per_feed_limit: usize,
    /// Maximum accepted feed size in bytes.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// Search language (`hl`).
    #[serde(default = "default_news_language")]
    pub language: String,
    /// Search region (`gl`).
    #[serde(default = "default_news_region")]
    pub region: String,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Topic catalog.
    #[serde(default = "default_topics")]
    pub topics: Vec<TopicConfig>,
}

fn default_request_timeout() -> u64 {
    8
}

fn default_max_fetch_duration() -> u64 {
    20
}

fn default_max_items_total() -> usize {
    60
}

fn default_per_feed_limit() -> usize {
    6
}

fn default_auto_per_feed_limit() -> usize {
    8
}

fn default_max_feed_size() -> u64 {
    5 * 1024 * 1024
}

fn default_news_language() -> String {
    "uk".to_string()
}

fn default_news_region() -> String {
    "UA".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; newsdigest/0.1)".to_string()
}

fn default_topics() -> Vec<TopicConfig> {
    vec![
        TopicConfig::new("ukraine", "Ukraine", "Україна"),
        TopicConfig::new("world", "World", "Світ"),
        TopicConfig::new("politics", "Politics", "Політика"),
        TopicConfig::new("economy", "Economy", "Економіка"),
        TopicConfig::new("technology", "Technology", "Технології"),
        TopicConfig::new("science", "Science", "Наука"),
        TopicConfig::new("sport", "Sport", "Спорт"),
        TopicConfig::new("business", "Business", "Бізнес"),
        TopicConfig::new("health", "Health", "Здоров’я"),
        TopicConfig::new("cinema", "Cinema", "Кіно"),
        TopicConfig::new("games", "Games", "Ігри"),
    ]
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_fetch_duration_secs: default_max_fetch_duration(),
            max_items_total: default_max_items_total(),
            per_feed_limit: default_per_feed_limit(),
            auto_per_feed_limit: default_auto_per_feed_limit(),
            max_feed_size_bytes: default_max_feed_size(),
            language: default_news_language(),
            region: default_news_region(),
            user_agent: default_user_agent(),
            topics: default_topics(),
        }
    }
}

/// Digest assembly configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DigestConfig {
    /// Maximum number of items in one digest.
    #[serde(default = "default_items_limit")]
    pub items_limit: usize,
    /// Maximum characters of a summarized digest.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Forget delivered links when keywords or topics change.
    #[serde(default = "default_reset_seen")]
    pub reset_seen_on_preference_change: bool,
}

fn default_items_limit() -> usize {
    6
}

fn default_max_chars() -> usize {
    3500
}

fn default_reset_seen() -> bool {
    true
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            items_limit: default_items_limit(),
            max_chars: default_max_chars(),
            reset_seen_on_preference_change: default_reset_seen(),
        }
    }
}

/// Delivery scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Enable scheduled delivery.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    /// Seconds between scheduler cycles (minimum 60).
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,
    /// Auto-delivery interval given to new users, in seconds.
    #[serde(default = "default_user_interval")]
    pub default_user_interval_secs: i64,
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_tick_interval() -> u64 {
    60
}

fn default_user_interval() -> i64 {
    1800
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            tick_interval_secs: default_tick_interval(),
            default_user_interval_secs: default_user_interval(),
        }
    }
}

/// Language model configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Use the language model for digests and chat.
    #[serde(default = "default_llm_enabled")]
    pub enabled: bool,
    /// API key. Empty disables the language model.
    #[serde(default)]
    pub api_key: String,
    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_llm_api_url")]
    pub api_url: String,
    /// Model name.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Maximum characters of news context sent per request.
    #[serde(default = "default_llm_max_input_chars")]
    pub max_input_chars: usize,
    /// Messages kept per chat as conversational context.
    #[serde(default = "default_chat_history_limit")]
    pub chat_history_limit: usize,
}

fn default_llm_enabled() -> bool {
    true
}

fn default_llm_api_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    25
}

fn default_llm_max_input_chars() -> usize {
    3500
}

fn default_chat_history_limit() -> usize {
    20
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_llm_enabled(),
            api_key: String::new(),
            api_url: default_llm_api_url(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_input_chars: default_llm_max_input_chars(),
            chat_history_limit: default_chat_history_limit(),
        }
    }
}

impl LlmConfig {
    /// Whether the language model can be used.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Enable the HTTP API.
    #[serde(default = "default_web_enabled")]
    pub enabled: bool,
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty or `*` allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Agent chat requests per minute per client IP.
    #[serde(default = "default_chat_rate_limit")]
    pub chat_rate_limit: u32,
}

fn default_web_enabled() -> bool {
    false
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_chat_rate_limit() -> u32 {
    20
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_web_enabled(),
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: Vec::new(),
            chat_rate_limit: default_chat_rate_limit(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DigestError::Io)?;
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
        toml::from_str(s).map_err(|e| DigestError::Validation(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `TELEGRAM_TOKEN`: Telegram bot token
    /// - `OPENAI_API_KEY`: language model API key
    /// - `NEWSDIGEST_DB_PATH`: database file path
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_empty_env("TELEGRAM_TOKEN") {
            self.telegram.token = token;
        }
        if let Some(key) = non_empty_env("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(path) = non_empty_env("NEWSDIGEST_DB_PATH") {
            self.database.path = path;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.digest.items_limit == 0 {
            return Err(DigestError::Validation(
                "digest.items_limit must be at least 1".to_string(),
            ));
        }
        if self.news.max_items_total == 0
            || self.news.per_feed_limit == 0
            || self.news.auto_per_feed_limit == 0
        {
            return Err(DigestError::Validation(
                "news.max_items_total, news.per_feed_limit and news.auto_per_feed_limit must be at least 1"
                    .to_string(),
            ));
        }
        if self.telegram.max_message_length == 0 {
            return Err(DigestError::Validation(
                "telegram.max_message_length must be at least 1".to_string(),
            ));
        }
        let mut keys = HashSet::new();
        for topic in &self.news.topics {
            if topic.key.trim().is_empty() || topic.query.trim().is_empty() {
                return Err(DigestError::Validation(format!(
                    "topic '{}' must have a key and a query",
                    topic.label
                )));
            }
            if topic.key.eq_ignore_ascii_case("all") {
                return Err(DigestError::Validation(
                    "topic key 'all' is reserved".to_string(),
                ));
            }
            // keys are matched against lowercased user input
            let well_formed = topic
                .key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
            if !well_formed {
                return Err(DigestError::Validation(format!(
                    "topic key '{}' must use lowercase letters, digits, '_' or '-'",
                    topic.key
                )));
            }
            if !keys.insert(topic.key.as_str()) {
                return Err(DigestError::Validation(format!(
                    "duplicate topic key '{}'",
                    topic.key
                )));
            }
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
