//! Digest assembly: summarized when possible, plain list otherwise.

use std::sync::Arc;

use tracing::{debug, warn};

use super::render::{fallback_digest, tags_balanced};
use crate::news::NewsItem;
use crate::summarizer::Summarizer;

/// Smallest candidate pool offered to the summarizer.
const MIN_CANDIDATES: usize = 12;

/// How a digest was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMode {
    Summarized,
    Fallback,
}

/// A rendered digest, ready to be chunked and sent.
#[derive(Debug, Clone)]
pub struct Digest {
    /// HTML text.
    pub text: String,
    pub mode: DigestMode,
    /// Number of candidates the digest was built from.
    pub candidates: usize,
}

/// Builds one digest message from new candidate items.
pub struct DigestAssembler {
    summarizer: Arc<dyn Summarizer>,
    items_limit: usize,
}

impl DigestAssembler {
    pub fn new(summarizer: Arc<dyn Summarizer>, items_limit: usize) -> Self {
        Self {
            summarizer,
            items_limit: items_limit.max(1),
        }
    }

    pub fn items_limit(&self) -> usize {
        self.items_limit
    }

    /// Assemble a digest, or `None` when there are no candidates.
    ///
    /// Summarizer failures are logged and answered with the plain list under
    /// `header`; they never surface to the caller.
    pub async fn assemble(
        &self,
        candidates: &[NewsItem],
        keywords: &[String],
        header: &str,
    ) -> Option<Digest> {
        if candidates.is_empty() {
            return None;
        }

        let pool_size = MIN_CANDIDATES.max(self.items_limit * 3);
        let pool = &candidates[..candidates.len().min(pool_size)];

        if self.summarizer.is_enabled() {
            match self.summarize(pool, keywords).await {
                Ok(text) => {
                    return Some(Digest {
                        text,
                        mode: DigestMode::Summarized,
                        candidates: pool.len(),
                    })
                }
                Err(e) => warn!(
                    "Summarizer {} failed, using plain digest: {}",
                    self.summarizer.name(),
                    e
                ),
            }
        }

        Some(Digest {
            text: fallback_digest(pool, header, self.items_limit),
            mode: DigestMode::Fallback,
            candidates: pool.len(),
        })
    }

    async fn summarize(&self, pool: &[NewsItem], keywords: &[String]) -> crate::Result<String> {
        let chosen = if keywords.is_empty() {
            pool.iter().take(self.items_limit).cloned().collect()
        } else {
            self.summarizer
                .select(pool, keywords, self.items_limit)
                .await?
        };
        debug!("Summarizing {} of {} candidate(s)", chosen.len(), pool.len());

        let text = self.summarizer.render(&chosen, keywords).await?;
        if text.trim().is_empty() {
            return Err(crate::DigestError::Summarizer(
                "empty digest".to_string(),
            ));
        }
        if !tags_balanced(&text) {
            return Err(crate::DigestError::Summarizer(
                "digest markup is not balanced".to_string(),
            ));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::DisabledSummarizer;
    use crate::{DigestError, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls and answers from a script.
    struct ScriptedSummarizer {
        render_reply: Option<String>,
        select_calls: Mutex<usize>,
        rendered_counts: Mutex<Vec<usize>>,
    }

    impl ScriptedSummarizer {
        fn new(render_reply: Option<&str>) -> Self {
            Self {
                render_reply: render_reply.map(str::to_string),
                select_calls: Mutex::new(0),
                rendered_counts: Mutex::new(Vec::new()),
            }
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
            *self.select_calls.lock().unwrap() += 1;
            Ok(candidates.iter().rev().take(max_keep).cloned().collect())
        }

        async fn render(&self, items: &[NewsItem], _keywords: &[String]) -> Result<String> {
            self.rendered_counts.lock().unwrap().push(items.len());
            self.render_reply
                .clone()
                .ok_or_else(|| DigestError::Summarizer("timeout".to_string()))
        }
    }

    fn items(n: usize) -> Vec<NewsItem> {
        (1..=n)
            .map(|i| NewsItem {
                source: "Google News".to_string(),
                topic: "World".to_string(),
                query: "world".to_string(),
                title: format!("Headline {i}"),
                summary: String::new(),
                content: String::new(),
                link: format!("https://example.com/{i}"),
                published_at: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_no_candidates_no_digest() {
        let assembler = DigestAssembler::new(Arc::new(DisabledSummarizer), 6);
        assert!(assembler.assemble(&[], &[], "<b>x</b>").await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_summarizer_uses_fallback() {
        let assembler = DigestAssembler::new(Arc::new(DisabledSummarizer), 3);
        let digest = assembler
            .assemble(&items(10), &[], "<b>Latest news</b>")
            .await
            .unwrap();

        assert_eq!(digest.mode, DigestMode::Fallback);
        assert!(digest.text.starts_with("<b>Latest news</b>"));
        assert_eq!(digest.text.matches("• ").count(), 3);
    }

    #[tokio::test]
    async fn test_summarized_without_keywords_skips_selection() {
        let summarizer = Arc::new(ScriptedSummarizer::new(Some("<b>Digest</b>")));
        let assembler = DigestAssembler::new(summarizer.clone(), 6);

        let digest = assembler.assemble(&items(20), &[], "h").await.unwrap();
        assert_eq!(digest.mode, DigestMode::Summarized);
        assert_eq!(digest.text, "<b>Digest</b>");
        assert_eq!(digest.candidates, 18);
        assert_eq!(*summarizer.select_calls.lock().unwrap(), 0);
        assert_eq!(*summarizer.rendered_counts.lock().unwrap(), vec![6]);
    }

    #[tokio::test]
    async fn test_summarized_with_keywords_selects() {
        let summarizer = Arc::new(ScriptedSummarizer::new(Some("text")));
        let assembler = DigestAssembler::new(summarizer.clone(), 2);

        let digest = assembler
            .assemble(&items(5), &["world".to_string()], "h")
            .await
            .unwrap();
        assert_eq!(digest.mode, DigestMode::Summarized);
        assert_eq!(digest.candidates, 5);
        assert_eq!(*summarizer.select_calls.lock().unwrap(), 1);
        assert_eq!(*summarizer.rendered_counts.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_render_failure_falls_back() {
        let summarizer = Arc::new(ScriptedSummarizer::new(None));
        let assembler = DigestAssembler::new(summarizer, 6);

        let digest = assembler
            .assemble(&items(4), &[], "<b>Latest news</b>")
            .await
            .unwrap();
        assert_eq!(digest.mode, DigestMode::Fallback);
        assert_eq!(digest.text.matches("Read more").count(), 4);
    }

    #[tokio::test]
    async fn test_blank_render_falls_back() {
        let summarizer = Arc::new(ScriptedSummarizer::new(Some("   ")));
        let assembler = DigestAssembler::new(summarizer, 6);

        let digest = assembler.assemble(&items(2), &[], "h").await.unwrap();
        assert_eq!(digest.mode, DigestMode::Fallback);
    }

    #[tokio::test]
    async fn test_unbalanced_markup_falls_back() {
        let reply = "<b>Digest</b>\n• Derby ends — <a href=\"https://news.example.com/derby\">Read";
        let summarizer = Arc::new(ScriptedSummarizer::new(Some(reply)));
        let assembler = DigestAssembler::new(summarizer, 6);

        let digest = assembler
            .assemble(&items(3), &[], "<b>Latest news</b>")
            .await
            .unwrap();
        assert_eq!(digest.mode, DigestMode::Fallback);
        assert!(digest.text.starts_with("<b>Latest news</b>"));
        assert!(tags_balanced(&digest.text));
    }
}
