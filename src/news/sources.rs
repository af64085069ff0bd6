//! Topic catalog and the feed sources derived from it.

use crate::config::{NewsConfig, TopicConfig};
use crate::profile::TopicSet;

/// Display name of the Google News search source.
pub const GOOGLE_NEWS: &str = "Google News";

/// Build a Google News RSS search URL.
pub fn google_news_url(query: &str, language: &str, region: &str) -> String {
    format!(
        "https://news.google.com/rss/search?q={}&hl={}&gl={}&ceid={}:{}",
        urlencoding::encode(query),
        language,
        region,
        region,
        language
    )
}

/// One feed to pull, tagged with the topic it represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String,
    pub topic_key: String,
    pub topic_label: String,
    pub query: String,
    pub url: String,
}

impl FeedSource {
    /// A Google News search feed for one topic.
    pub fn google_news(key: &str, label: &str, query: &str, language: &str, region: &str) -> Self {
        Self {
            name: GOOGLE_NEWS.to_string(),
            topic_key: key.to_string(),
            topic_label: label.to_string(),
            query: query.to_string(),
            url: google_news_url(query, language, region),
        }
    }
}

/// The configured set of topics, in display order.
#[derive(Debug, Clone)]
pub struct TopicCatalog {
    topics: Vec<TopicConfig>,
    language: String,
    region: String,
}

impl TopicCatalog {
    /// Build the catalog from the news configuration.
    pub fn from_config(config: &NewsConfig) -> Self {
        Self {
            topics: config
                .topics
                .iter()
                .map(|t| TopicConfig {
                    key: t.key.trim().to_lowercase(),
                    label: t.label.clone(),
                    query: t.query.clone(),
                })
                .collect(),
            language: config.language.clone(),
            region: config.region.clone(),
        }
    }

    /// Look up a topic by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&TopicConfig> {
        let key = key.trim().to_lowercase();
        self.topics.iter().find(|t| t.key == key)
    }

    /// Whether `key` names a topic in the catalog.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TopicConfig> {
        self.topics.iter()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Comma separated list of keys, for prompts and help text.
    pub fn keys_display(&self) -> String {
        self.topics
            .iter()
            .map(|t| t.key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Feed sources for the selected topics. An empty selection means all topics.
    pub fn sources(&self, selected: &TopicSet) -> Vec<FeedSource> {
        self.topics
            .iter()
            .filter(|t| selected.is_all() || selected.contains(&t.key))
            .map(|t| FeedSource::google_news(&t.key, &t.label, &t.query, &self.language, &self.region))
            .collect()
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::from_config(&NewsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_news_url_encodes_query() {
        let url = google_news_url("Здоров’я", "uk", "UA");
        assert!(url.starts_with("https://news.google.com/rss/search?q=%D0%97"));
        assert!(url.ends_with("&hl=uk&gl=UA&ceid=UA:uk"));

        let url = google_news_url("rust lang", "en", "US");
        assert_eq!(
            url,
            "https://news.google.com/rss/search?q=rust%20lang&hl=en&gl=US&ceid=US:en"
        );
    }

    #[test]
    fn test_catalog_lookup_is_case_insensitive() {
        let catalog = TopicCatalog::default();
        assert!(catalog.contains("sport"));
        assert!(catalog.contains(" Sport "));
        assert!(!catalog.contains("knitting"));
        assert_eq!(catalog.get("games").unwrap().label, "Games");
    }

    #[test]
    fn test_sources_all_topics_when_selection_empty() {
        let catalog = TopicCatalog::default();
        let sources = catalog.sources(&TopicSet::all());
        assert_eq!(sources.len(), catalog.len());
        assert!(sources.iter().all(|s| s.name == GOOGLE_NEWS));
    }

    #[test]
    fn test_sources_restricted_to_selection() {
        let catalog = TopicCatalog::default();
        let selected = TopicSet::parse("sport, games", &catalog);
        let sources = catalog.sources(&selected);
        let keys: Vec<_> = sources.iter().map(|s| s.topic_key.as_str()).collect();
        assert_eq!(keys, vec!["sport", "games"]);
    }
}
