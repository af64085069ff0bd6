//! Language model capabilities: digest selection/rendering and chat replies.

pub mod api_types;
pub mod disabled;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{DigestConfig, LlmConfig};
use crate::history::ChatMessage;
use crate::news::NewsItem;
use crate::Result;

pub use disabled::DisabledSummarizer;
pub use openai::{parse_selection, OpenAiClient};

/// Picks and summarizes digest items.
///
/// Any error makes the caller fall back to plain rendering.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Whether calls can succeed at all.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Choose up to `max_keep` candidates relevant to `keywords`, in order.
    async fn select(
        &self,
        candidates: &[NewsItem],
        keywords: &[String],
        max_keep: usize,
    ) -> Result<Vec<NewsItem>>;

    /// Render `items` as one HTML digest message.
    async fn render(&self, items: &[NewsItem], keywords: &[String]) -> Result<String>;
}

/// Conversational assistant.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    /// Answer `message` given earlier turns and optional news context.
    async fn reply(
        &self,
        history: &[ChatMessage],
        message: &str,
        context: &[NewsItem],
    ) -> Result<String>;
}

/// Build the language model backends from configuration.
///
/// A missing key or a client that cannot be built yields disabled backends.
pub fn from_config(
    llm: &LlmConfig,
    digest: &DigestConfig,
) -> (Arc<dyn Summarizer>, Arc<dyn ChatAgent>) {
    if !llm.is_usable() {
        warn!("Language model disabled: no API key configured or llm.enabled = false");
        return disabled();
    }

    match OpenAiClient::new(llm, digest.max_chars) {
        Ok(client) => {
            let client = Arc::new(client);
            let summarizer: Arc<dyn Summarizer> = client.clone();
            let agent: Arc<dyn ChatAgent> = client;
            (summarizer, agent)
        }
        Err(e) => {
            warn!("Language model disabled: {}", e);
            disabled()
        }
    }
}

fn disabled() -> (Arc<dyn Summarizer>, Arc<dyn ChatAgent>) {
    let summarizer: Arc<dyn Summarizer> = Arc::new(DisabledSummarizer);
    let agent: Arc<dyn ChatAgent> = Arc::new(DisabledSummarizer);
    (summarizer, agent)
}
