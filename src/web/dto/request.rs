//! Request DTOs.

use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::validation::topic_key;

/// Topic value meaning "every topic".
pub const ALL_TOPICS: &str = "all";

fn default_topic() -> String {
    ALL_TOPICS.to_string()
}

fn default_news_limit() -> u32 {
    30
}

fn default_chat_limit() -> u32 {
    10
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(String::deserialize(deserializer)?.trim().to_string())
}

/// Query of `GET /api/news`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewsQuery {
    /// Topic key or "all".
    #[serde(default = "default_topic")]
    #[validate(custom(function = "topic_key"))]
    pub topic: String,
    /// Optional keyword filter.
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_news_limit")]
    #[validate(range(min = 1, max = 100, message = "Must be between 1 and 100"))]
    pub limit: u32,
}

/// Body of `POST /api/agent/chat`.
#[derive(Debug, Deserialize, Validate)]
pub struct AgentChatRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 4000, message = "Must not be empty or longer than 4000 characters"))]
    pub message: String,
    /// Topic whose news is given as context. Unknown keys mean every topic.
    #[serde(default = "default_topic")]
    #[validate(custom(function = "topic_key"))]
    pub topic: String,
    #[serde(default = "default_chat_limit")]
    #[validate(range(min = 1, max = 100, message = "Must be between 1 and 100"))]
    pub limit: u32,
}
