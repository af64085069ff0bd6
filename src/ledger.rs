//! Seen-link ledger: the durable record of links already delivered per chat.
//!
//! A `(chat_id, link)` pair is inserted at most once. The insert itself decides
//! whether an item is new, so concurrent callers can never both deliver it.

use tracing::debug;

use crate::db::DbPool;
use crate::news::NewsItem;
use crate::{DigestError, Result};

/// Repository over the `seen_links` table.
pub struct SeenLinkLedger<'a> {
    pool: &'a DbPool,
}

impl<'a> SeenLinkLedger<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Record each item's link and return only the items not delivered before.
    ///
    /// Items without a link are dropped. Order is preserved.
    pub async fn filter_new(&self, chat_id: i64, items: Vec<NewsItem>) -> Result<Vec<NewsItem>> {
        let total = items.len();
        let mut fresh = Vec::new();

        for item in items {
            let link = item.link.trim();
            if link.is_empty() {
                continue;
            }
            if self.record(chat_id, link).await? {
                fresh.push(item);
            }
        }

        debug!(
            "Chat {}: {} of {} item(s) are new",
            chat_id,
            fresh.len(),
            total
        );
        Ok(fresh)
    }

    /// Insert the pair if absent. Returns true if this call created it.
    pub async fn record(&self, chat_id: i64, link: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO seen_links (chat_id, link) VALUES ($1, $2)")
            .bind(chat_id)
            .bind(link)
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Forget every link delivered to `chat_id`. Returns the number removed.
    pub async fn clear(&self, chat_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM seen_links WHERE chat_id = $1")
            .bind(chat_id)
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    pub async fn contains(&self, chat_id: i64, link: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM seen_links WHERE chat_id = $1 AND link = $2)",
        )
        .bind(chat_id)
        .bind(link.trim())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(exists)
    }

    pub async fn count(&self, chat_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_links WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(count)
    }
}
