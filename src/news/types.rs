//! News item types.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// A feed entry as delivered by the feed parser, before cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl RawEntry {
    /// Create an entry with a title and link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            link: Some(link.into()),
            ..Default::default()
        }
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// A normalized news item. `link` is its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    /// Source name, e.g. "Google News".
    pub source: String,
    /// Topic label the item was fetched for.
    pub topic: String,
    /// Search query the item was fetched with.
    pub query: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Stable identifier derived from the link.
    pub fn id(&self) -> String {
        format!("{:x}", Sha256::digest(self.link.as_bytes()))
    }

    /// Text searched by keyword filters.
    pub fn haystack(&self) -> String {
        format!("{} {} {}", self.title, self.summary, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(link: &str) -> NewsItem {
        NewsItem {
            source: "Google News".to_string(),
            topic: "Sport".to_string(),
            query: "sport".to_string(),
            title: "Final tonight".to_string(),
            summary: "Derby preview".to_string(),
            content: String::new(),
            link: link.to_string(),
            published_at: None,
        }
    }

    #[test]
    fn test_id_is_stable_per_link() {
        let a = item("https://example.com/a");
        let b = item("https://example.com/a");
        let c = item("https://example.com/c");
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_eq!(a.id().len(), 64);
    }

    #[test]
    fn test_haystack_joins_fields() {
        let haystack = item("https://example.com/a").haystack();
        assert!(haystack.contains("Final tonight"));
        assert!(haystack.contains("Derby preview"));
    }
}
