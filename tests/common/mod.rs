//! Shared fakes and setup for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use newsdigest::config::{Config, TopicConfig};
use newsdigest::history::ChatMessage;
use newsdigest::news::{FeedFetcher, NewsCollector, NewsItem, RawEntry};
use newsdigest::summarizer::{ChatAgent, Summarizer};
use newsdigest::transport::MemoryTransport;
use newsdigest::{Database, DigestError, DigestService, Result};

/// Serves canned entries. A URL containing a registered needle gets that
/// needle's entries, any other URL gets the default list.
#[derive(Default)]
pub struct StaticFetcher {
    default: Vec<RawEntry>,
    by_needle: Vec<(String, Vec<RawEntry>)>,
    calls: Mutex<usize>,
}

impl StaticFetcher {
    pub fn new(entries: Vec<RawEntry>) -> Self {
        Self {
            default: entries,
            ..Self::default()
        }
    }

    pub fn with_feed(mut self, needle: &str, entries: Vec<RawEntry>) -> Self {
        self.by_needle.push((needle.to_string(), entries));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl FeedFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        Ok(self
            .by_needle
            .iter()
            .find(|(needle, _)| url.contains(needle.as_str()))
            .map(|(_, entries)| entries.clone())
            .unwrap_or_else(|| self.default.clone()))
    }
}

/// Summarizer with scripted behavior.
pub struct ScriptedSummarizer {
    /// Reverse the candidate order on selection.
    pub reverse: bool,
    pub fail_render: bool,
    pub select_calls: Mutex<usize>,
}

impl ScriptedSummarizer {
    pub fn working() -> Self {
        Self {
            reverse: true,
            fail_render: false,
            select_calls: Mutex::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_render: true,
            ..Self::working()
        }
    }

    pub fn select_calls(&self) -> usize {
        self.select_calls.lock().map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn select(
        &self,
        candidates: &[NewsItem],
        _keywords: &[String],
        max_keep: usize,
    ) -> Result<Vec<NewsItem>> {
        if let Ok(mut calls) = self.select_calls.lock() {
            *calls += 1;
        }
        let mut chosen: Vec<NewsItem> = candidates.to_vec();
        if self.reverse {
            chosen.reverse();
        }
        chosen.truncate(max_keep);
        Ok(chosen)
    }

    async fn render(&self, items: &[NewsItem], _keywords: &[String]) -> Result<String> {
        if self.fail_render {
            return Err(DigestError::Summarizer("request timed out".to_string()));
        }
        let mut lines = vec!["<b>AI digest</b>".to_string()];
        lines.extend(items.iter().map(|i| format!("- {}", i.title)));
        Ok(lines.join("\n"))
    }
}

/// Chat agent that echoes with a count of earlier turns and context items.
pub struct EchoAgent;

#[async_trait]
impl ChatAgent for EchoAgent {
    async fn reply(
        &self,
        history: &[ChatMessage],
        message: &str,
        context: &[NewsItem],
    ) -> Result<String> {
        Ok(format!(
            "echo[{} turns, {} items]: {}",
            history.len(),
            context.len(),
            message
        ))
    }
}

pub fn topic(key: &str, label: &str) -> TopicConfig {
    TopicConfig {
        key: key.to_string(),
        label: label.to_string(),
        query: key.to_string(),
    }
}

/// Config with one "world" topic and room for 20 items per feed.
pub fn single_topic_config() -> Config {
    let mut config = Config::default();
    config.news.topics = vec![topic("world", "World")];
    config.news.per_feed_limit = 20;
    config.news.auto_per_feed_limit = 20;
    config
}

/// `n` entries titled "Story 01", "Story 02", ...
pub fn numbered_entries(n: usize) -> Vec<RawEntry> {
    (1..=n)
        .map(|i| RawEntry::new(format!("Story {i:02}"), format!("https://news.test/story/{i}")))
        .collect()
}

pub struct Harness {
    pub config: Config,
    pub db: Arc<Database>,
    pub collector: Arc<NewsCollector>,
    pub transport: Arc<MemoryTransport>,
    pub digests: Arc<DigestService>,
}

pub async fn harness(
    config: Config,
    fetcher: StaticFetcher,
    summarizer: Arc<dyn Summarizer>,
) -> Harness {
    let db = Arc::new(Database::open_in_memory().await.unwrap());
    let collector = Arc::new(NewsCollector::new(Arc::new(fetcher), &config.news));
    let transport = Arc::new(MemoryTransport::new());
    let digests = Arc::new(DigestService::new(
        db.clone(),
        collector.clone(),
        summarizer,
        transport.clone(),
        &config,
    ));
    Harness {
        config,
        db,
        collector,
        transport,
        digests,
    }
}
