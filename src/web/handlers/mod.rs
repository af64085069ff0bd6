//! API handlers.

pub mod agent;
pub mod news;

use std::sync::Arc;

use axum::Json;

use crate::news::NewsCollector;
use crate::summarizer::ChatAgent;
use crate::web::dto::HealthResponse;

pub use agent::agent_chat;
pub use news::{list_news, list_topics};

/// Default number of items taken from each source.
const DEFAULT_PER_FEED_LIMIT: usize = 6;

/// Shared state of the HTTP API. Requests are stateless: no profile or
/// seen-link bookkeeping happens here.
pub struct AppState {
    pub collector: Arc<NewsCollector>,
    pub agent: Arc<dyn ChatAgent>,
    pub per_feed_limit: usize,
}

impl AppState {
    pub fn new(collector: Arc<NewsCollector>, agent: Arc<dyn ChatAgent>) -> Self {
        Self {
            collector,
            agent,
            per_feed_limit: DEFAULT_PER_FEED_LIMIT,
        }
    }

    pub fn with_per_feed_limit(mut self, limit: usize) -> Self {
        self.per_feed_limit = limit.max(1);
        self
    }
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
