//! Response DTOs.

use serde::Serialize;

use crate::news::NewsItem;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// One selectable topic.
#[derive(Debug, Serialize)]
pub struct TopicResponse {
    pub key: String,
    pub label: String,
}

/// A news item as exposed over HTTP.
#[derive(Debug, Serialize)]
pub struct NewsItemResponse {
    /// SHA-256 of the link.
    pub id: String,
    pub title: String,
    pub link: String,
    pub source: String,
    pub summary: String,
    /// RFC 3339, when the feed provides it.
    pub published_at: Option<String>,
    pub topic: String,
    pub query: String,
}

impl From<&NewsItem> for NewsItemResponse {
    fn from(item: &NewsItem) -> Self {
        Self {
            id: item.id(),
            title: item.title.clone(),
            link: item.link.clone(),
            source: item.source.clone(),
            summary: item.summary.clone(),
            published_at: item.published_at.map(|dt| dt.to_rfc3339()),
            topic: item.topic.clone(),
            query: item.query.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewsListMeta {
    pub topic: String,
    pub query: String,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct NewsListResponse {
    pub items: Vec<NewsItemResponse>,
    pub meta: NewsListMeta,
}

#[derive(Debug, Serialize)]
pub struct AgentChatResponse {
    pub answer: String,
    /// News given to the assistant as context.
    pub items: Vec<NewsItemResponse>,
}
