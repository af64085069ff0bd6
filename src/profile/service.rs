//! Settings operations with their side effects on the seen-link ledger.

use tracing::info;

use super::repository::ProfileRepository;
use super::types::{AutoInterval, InputState, KeywordSet, TopicSet, UserProfile};
use crate::db::Database;
use crate::ledger::SeenLinkLedger;
use crate::news::TopicCatalog;
use crate::Result;

/// Service for profile settings.
pub struct ProfileService<'a> {
    db: &'a Database,
    default_interval: AutoInterval,
    reset_seen_on_change: bool,
}

impl<'a> ProfileService<'a> {
    /// Create a service with default policy: new chats get 30 minutes and
    /// preference changes forget delivered links.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            default_interval: AutoInterval::default(),
            reset_seen_on_change: true,
        }
    }

    /// Interval given to newly created profiles.
    pub fn with_default_interval(mut self, interval: AutoInterval) -> Self {
        self.default_interval = interval;
        self
    }

    /// Whether changing keywords or topics clears the chat's seen links.
    pub fn with_reset_seen(mut self, reset: bool) -> Self {
        self.reset_seen_on_change = reset;
        self
    }

    fn repo(&self) -> ProfileRepository<'a> {
        ProfileRepository::new(self.db.pool())
    }

    /// Get the profile, creating it on first interaction.
    pub async fn ensure(&self, chat_id: i64) -> Result<UserProfile> {
        self.repo().ensure(chat_id, self.default_interval).await
    }

    pub async fn set_input_state(&self, chat_id: i64, state: InputState) -> Result<()> {
        self.repo().update_input_state(chat_id, state).await
    }

    /// Replace the keyword list with the parsed `text`.
    pub async fn set_keywords(&self, chat_id: i64, text: &str) -> Result<KeywordSet> {
        let keywords = KeywordSet::parse(text);
        self.repo().update_keywords(chat_id, &keywords).await?;
        self.preferences_changed(chat_id).await?;
        Ok(keywords)
    }

    pub async fn clear_keywords(&self, chat_id: i64) -> Result<()> {
        self.repo()
            .update_keywords(chat_id, &KeywordSet::default())
            .await?;
        self.preferences_changed(chat_id).await
    }

    /// Replace the topic selection with the keys in `text` known to `catalog`.
    pub async fn set_topics(
        &self,
        chat_id: i64,
        text: &str,
        catalog: &TopicCatalog,
    ) -> Result<TopicSet> {
        let topics = TopicSet::parse(text, catalog);
        self.repo().update_topics(chat_id, &topics).await?;
        self.preferences_changed(chat_id).await?;
        Ok(topics)
    }

    pub async fn clear_topics(&self, chat_id: i64) -> Result<()> {
        self.repo().update_topics(chat_id, &TopicSet::all()).await?;
        self.preferences_changed(chat_id).await
    }

    /// Set the auto-delivery interval from a reply in minutes.
    ///
    /// Non-numeric input is a validation error and leaves the profile unchanged.
    pub async fn set_interval(&self, chat_id: i64, text: &str) -> Result<AutoInterval> {
        let interval = AutoInterval::parse_minutes(text)?;
        self.repo().update_auto_interval(chat_id, interval).await?;
        Ok(interval)
    }

    async fn preferences_changed(&self, chat_id: i64) -> Result<()> {
        if !self.reset_seen_on_change {
            return Ok(());
        }
        let removed = SeenLinkLedger::new(self.db.pool()).clear(chat_id).await?;
        if removed > 0 {
            info!(
                "Chat {}: preferences changed, forgot {} delivered link(s)",
                chat_id, removed
            );
        }
        Ok(())
    }
}
