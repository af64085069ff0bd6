//! Typed profile values, validated where user text enters the system.

use chrono::{DateTime, Utc};

use crate::news::TopicCatalog;
use crate::{DigestError, Result};

/// Lower bound for the auto-delivery interval.
pub const MIN_AUTO_INTERVAL_SECS: i64 = 60;

/// Storage separator for keyword and topic lists.
const STORED_SEPARATOR: &str = ",";

/// What the next free-text message from a chat is expected to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputState {
    #[default]
    Idle,
    AwaitingKeywords,
    AwaitingTopics,
    AwaitingInterval,
}

impl InputState {
    /// Database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputState::Idle => "",
            InputState::AwaitingKeywords => "await_keywords",
            InputState::AwaitingTopics => "await_topics",
            InputState::AwaitingInterval => "await_interval",
        }
    }

    /// Parse the database representation. Unknown values read as idle.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "await_keywords" => InputState::AwaitingKeywords,
            "await_topics" => InputState::AwaitingTopics,
            "await_interval" => InputState::AwaitingInterval,
            _ => InputState::Idle,
        }
    }
}

/// Split a user-entered list on commas, semicolons and newlines.
/// Entries are trimmed, lowercased and deduplicated in input order.
fn split_list(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in text.split([',', ';', '\n']) {
        let part = part.trim().to_lowercase();
        if !part.is_empty() && !out.contains(&part) {
            out.push(part);
        }
    }
    out
}

/// Normalized keywords. Empty means "no keyword filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    pub fn parse(text: &str) -> Self {
        Self(split_list(text))
    }

    pub fn to_stored(&self) -> String {
        self.0.join(STORED_SEPARATOR)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Human readable list, e.g. for settings replies.
    pub fn display(&self) -> String {
        self.0.join(", ")
    }
}

/// Selected topic keys. Empty means "all topics".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSet(Vec<String>);

impl TopicSet {
    /// The unrestricted selection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse user input against the catalog.
    ///
    /// `all` anywhere in the list selects every topic. Unknown keys are dropped.
    pub fn parse(text: &str, catalog: &TopicCatalog) -> Self {
        let keys = split_list(text);
        if keys.iter().any(|k| k == "all") {
            return Self::all();
        }
        Self(keys.into_iter().filter(|k| catalog.contains(k)).collect())
    }

    /// Read a stored list without validation.
    pub fn from_stored(s: &str) -> Self {
        Self(split_list(s))
    }

    pub fn to_stored(&self) -> String {
        self.0.join(STORED_SEPARATOR)
    }

    pub fn is_all(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn display(&self) -> String {
        self.0.join(", ")
    }
}

/// Auto-delivery interval, never shorter than [`MIN_AUTO_INTERVAL_SECS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoInterval(i64);

impl AutoInterval {
    /// Build from seconds, raising anything below the minimum.
    pub fn from_secs(secs: i64) -> Self {
        Self(secs.max(MIN_AUTO_INTERVAL_SECS))
    }

    /// Parse a user reply given in whole minutes.
    pub fn parse_minutes(text: &str) -> Result<Self> {
        let minutes: i64 = text
            .trim()
            .parse()
            .map_err(|_| DigestError::Validation(format!("not a number of minutes: {text:?}")))?;
        Ok(Self::from_secs(minutes.saturating_mul(60)))
    }

    pub fn as_secs(&self) -> i64 {
        self.0
    }

    pub fn as_minutes(&self) -> i64 {
        self.0 / 60
    }
}

impl Default for AutoInterval {
    fn default() -> Self {
        Self(1800)
    }
}

/// Durable per-chat configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub chat_id: i64,
    pub keywords: KeywordSet,
    pub topics: TopicSet,
    pub input_state: InputState,
    pub auto_interval: AutoInterval,
    /// When the scheduler last processed this chat.
    pub last_auto_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Whether a scheduled digest is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_auto_at {
            None => true,
            Some(last) => (now - last).num_seconds() >= self.auto_interval.as_secs(),
        }
    }
}
