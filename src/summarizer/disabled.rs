//! Stand-in used when no language model is configured.

use async_trait::async_trait;

use super::{ChatAgent, Summarizer};
use crate::history::ChatMessage;
use crate::news::NewsItem;
use crate::{DigestError, Result};

/// Every call fails with a configuration error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSummarizer;

fn not_configured() -> DigestError {
    DigestError::Config("language model is not configured".to_string())
}

#[async_trait]
impl Summarizer for DisabledSummarizer {
    fn name(&self) -> &str {
        "disabled"
    }

    fn is_enabled(&self) -> bool {
        false
    }

    async fn select(&self, _: &[NewsItem], _: &[String], _: usize) -> Result<Vec<NewsItem>> {
        Err(not_configured())
    }

    async fn render(&self, _: &[NewsItem], _: &[String]) -> Result<String> {
        Err(not_configured())
    }
}

#[async_trait]
impl ChatAgent for DisabledSummarizer {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn reply(&self, _: &[ChatMessage], _: &str, _: &[NewsItem]) -> Result<String> {
        Err(not_configured())
    }
}
