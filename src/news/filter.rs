//! Keyword matching over news items.

use regex::Regex;
use tracing::warn;

use super::types::NewsItem;

/// Compiled keyword filter. An empty filter matches every item.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    patterns: Vec<Regex>,
}

impl KeywordMatcher {
    /// Compile a matcher from normalized keywords.
    ///
    /// A keyword with whitespace matches as a case-insensitive substring.
    /// A single word must not touch another word character on either side.
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let patterns = keywords
            .iter()
            .map(|k| k.as_ref().trim())
            .filter(|k| !k.is_empty())
            .filter_map(|k| match Regex::new(&keyword_pattern(k)) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping keyword {:?}: {}", k, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Whether no keywords are configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether the item matches any keyword.
    pub fn matches(&self, item: &NewsItem) -> bool {
        self.is_empty() || self.matches_text(&item.haystack())
    }

    /// Whether `text` matches any keyword.
    pub fn matches_text(&self, text: &str) -> bool {
        self.is_empty() || self.patterns.iter().any(|re| re.is_match(text))
    }
}

fn keyword_pattern(keyword: &str) -> String {
    let escaped = regex::escape(keyword);
    if keyword.contains(char::is_whitespace) {
        format!("(?i){escaped}")
    } else {
        format!(r"(?i)(?:^|\W){escaped}(?:\W|$)")
    }
}
