//! Collection of filtered candidate items across topic sources.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use super::fetcher::FeedFetcher;
use super::filter::KeywordMatcher;
use super::normalize::normalize_entry;
use super::sources::TopicCatalog;
use super::types::NewsItem;
use crate::config::NewsConfig;
use crate::profile::TopicSet;

/// Pulls every selected source within a wall-clock budget and returns
/// matching items, deduplicated by link.
pub struct NewsCollector {
    fetcher: Arc<dyn FeedFetcher>,
    catalog: TopicCatalog,
    request_timeout: Duration,
    fetch_budget: Duration,
    max_items_total: usize,
}

impl NewsCollector {
    /// Create a collector over `fetcher` using limits from `config`.
    pub fn new(fetcher: Arc<dyn FeedFetcher>, config: &NewsConfig) -> Self {
        Self {
            fetcher,
            catalog: TopicCatalog::from_config(config),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            fetch_budget: Duration::from_secs(config.max_fetch_duration_secs),
            max_items_total: config.max_items_total,
        }
    }

    /// The topic catalog sources are drawn from.
    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    /// Collect candidate items.
    ///
    /// At most `per_feed_limit` matching items are taken from each source and
    /// `max_items_total` overall. A failing or slow source is skipped. Once the
    /// budget is spent no further source is started and what was gathered so
    /// far is returned.
    pub async fn collect(
        &self,
        keywords: &[String],
        topics: &TopicSet,
        per_feed_limit: usize,
    ) -> Vec<NewsItem> {
        let matcher = KeywordMatcher::new(keywords);
        let deadline = Instant::now() + self.fetch_budget;
        let mut seen_links = HashSet::new();
        let mut items = Vec::new();

        for source in self.catalog.sources(topics) {
            if items.len() >= self.max_items_total {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    "Fetch budget of {}s exhausted, skipping remaining sources",
                    self.fetch_budget.as_secs()
                );
                break;
            }
            let allowed = self.request_timeout.min(deadline - now);

            let entries = match timeout(allowed, self.fetcher.fetch(&source.url)).await {
                Ok(Ok(entries)) => entries,
                Ok(Err(e)) => {
                    warn!("Failed to fetch source {}: {}", source.topic_key, e);
                    continue;
                }
                Err(_) => {
                    warn!(
                        "Source {} timed out after {}ms",
                        source.topic_key,
                        allowed.as_millis()
                    );
                    continue;
                }
            };

            let mut taken = 0;
            for entry in entries {
                if taken >= per_feed_limit || items.len() >= self.max_items_total {
                    break;
                }
                let item = normalize_entry(entry, &source);
                if item.link.is_empty() || !matcher.matches(&item) {
                    continue;
                }
                if seen_links.insert(item.link.clone()) {
                    taken += 1;
                    items.push(item);
                }
            }
            debug!("Source {} contributed {} item(s)", source.topic_key, taken);
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::news::types::RawEntry;
    use crate::{DigestError, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned entries keyed by a substring of the URL.
    struct CannedFetcher {
        feeds: HashMap<&'static str, Vec<RawEntry>>,
        delay: Duration,
    }

    #[async_trait]
    impl FeedFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
            tokio::time::sleep(self.delay).await;
            self.feeds
                .iter()
                .find(|(needle, _)| url.contains(*needle))
                .map(|(_, entries)| entries.clone())
                .ok_or_else(|| DigestError::Feed("HTTP error: 500".to_string()))
        }
    }

    fn config_with_topics(keys: &[(&str, &str)]) -> NewsConfig {
        NewsConfig {
            topics: keys
                .iter()
                .map(|(key, query)| crate::config::TopicConfig {
                    key: key.to_string(),
                    label: key.to_uppercase(),
                    query: query.to_string(),
                })
                .collect(),
            ..NewsConfig::default()
        }
    }

    fn collector(feeds: HashMap<&'static str, Vec<RawEntry>>, config: &NewsConfig) -> NewsCollector {
        NewsCollector::new(
            Arc::new(CannedFetcher {
                feeds,
                delay: Duration::ZERO,
            }),
            config,
        )
    }

    #[tokio::test]
    async fn test_collect_filters_and_dedupes() {
        let config = config_with_topics(&[("alpha", "alpha"), ("beta", "beta")]);
        let mut feeds = HashMap::new();
        feeds.insert(
            "q=alpha",
            vec![
                RawEntry::new("Rust release", "https://x/1"),
                RawEntry::new("Cooking tips", "https://x/2"),
                RawEntry::new("Rust conf", "https://x/3"),
            ],
        );
        feeds.insert(
            "q=beta",
            vec![
                RawEntry::new("Rust release again", "https://x/1"),
                RawEntry::new("Rust book", "https://x/4"),
            ],
        );

        let items = collector(feeds, &config)
            .collect(&["rust".to_string()], &TopicSet::all(), 6)
            .await;
        let links: Vec<_> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://x/1", "https://x/3", "https://x/4"]);
        assert_eq!(items[0].topic, "ALPHA");
        assert_eq!(items[2].topic, "BETA");
    }

    #[tokio::test]
    async fn test_collect_honors_limits_and_topics() {
        let mut config = config_with_topics(&[("alpha", "alpha"), ("beta", "beta")]);
        config.max_items_total = 3;
        let mut feeds: HashMap<&'static str, Vec<RawEntry>> = HashMap::new();
        feeds.insert(
            "q=alpha",
            (1..=5)
                .map(|i| RawEntry::new(format!("a{i}"), format!("https://a/{i}")))
                .collect(),
        );
        feeds.insert(
            "q=beta",
            (1..=5)
                .map(|i| RawEntry::new(format!("b{i}"), format!("https://b/{i}")))
                .collect(),
        );
        let collector = collector(feeds, &config);

        let items = collector.collect(&[], &TopicSet::all(), 2).await;
        let links: Vec<_> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://a/1", "https://a/2", "https://b/1"]);

        let only_beta = TopicSet::parse("beta", collector.catalog());
        let items = collector.collect(&[], &only_beta, 2).await;
        assert!(items.iter().all(|i| i.link.starts_with("https://b/")));
    }

    #[tokio::test]
    async fn test_collect_skips_failing_source_and_empty_links() {
        let config = config_with_topics(&[("broken", "broken"), ("ok", "ok")]);
        let mut feeds = HashMap::new();
        feeds.insert(
            "q=ok",
            vec![
                RawEntry {
                    title: Some("no link".to_string()),
                    ..Default::default()
                },
                RawEntry::new("has link", "https://ok/1"),
            ],
        );

        let items = collector(feeds, &config)
            .collect(&[], &TopicSet::all(), 6)
            .await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].link, "https://ok/1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_stops_when_budget_spent() {
        let mut config = config_with_topics(&[("one", "one"), ("two", "two"), ("three", "three")]);
        config.request_timeout_secs = 8;
        config.max_fetch_duration_secs = 10;
        let mut feeds = HashMap::new();
        feeds.insert("q=one", vec![RawEntry::new("first", "https://1/1")]);
        feeds.insert("q=two", vec![RawEntry::new("second", "https://2/1")]);
        feeds.insert("q=three", vec![RawEntry::new("third", "https://3/1")]);

        let collector = NewsCollector::new(
            Arc::new(CannedFetcher {
                feeds,
                delay: Duration::from_secs(6),
            }),
            &config,
        );

        // first source finishes at 6s, second is cut off at the 10s deadline
        let items = collector.collect(&[], &TopicSet::all(), 6).await;
        let links: Vec<_> = items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["https://1/1"]);
    }
}
