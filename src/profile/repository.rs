//! Profile repository.

use chrono::{DateTime, Utc};

use super::types::{AutoInterval, InputState, KeywordSet, TopicSet, UserProfile};
use crate::db::DbPool;
use crate::{DigestError, Result};

#[derive(Debug, Clone, sqlx::FromRow)]
struct UserRow {
    chat_id: i64,
    keywords: String,
    topics: String,
    input_state: String,
    auto_interval_sec: i64,
    last_auto_at: Option<String>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            chat_id: row.chat_id,
            keywords: KeywordSet::parse(&row.keywords),
            topics: TopicSet::from_stored(&row.topics),
            input_state: InputState::from_stored(&row.input_state),
            auto_interval: AutoInterval::from_secs(row.auto_interval_sec),
            last_auto_at: row.last_auto_at.and_then(|s| parse_datetime(&s)),
        }
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

const SELECT_COLUMNS: &str =
    "SELECT chat_id, keywords, topics, input_state, auto_interval_sec, last_auto_at FROM users";

/// Repository for per-chat profiles.
pub struct ProfileRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create the profile if it does not exist yet and return it.
    pub async fn ensure(&self, chat_id: i64, default_interval: AutoInterval) -> Result<UserProfile> {
        sqlx::query("INSERT OR IGNORE INTO users (chat_id, auto_interval_sec) VALUES ($1, $2)")
            .bind(chat_id)
            .bind(default_interval.as_secs())
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        self.get(chat_id)
            .await?
            .ok_or_else(|| DigestError::NotFound("user".to_string()))
    }

    pub async fn get(&self, chat_id: i64) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} WHERE chat_id = $1"))
            .bind(chat_id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(row.map(UserProfile::from))
    }

    /// All known profiles, ordered by chat id.
    pub async fn list(&self) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_COLUMNS} ORDER BY chat_id"))
            .fetch_all(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;
        Ok(count)
    }

    pub async fn update_keywords(&self, chat_id: i64, keywords: &KeywordSet) -> Result<()> {
        self.update_column(chat_id, "keywords", keywords.to_stored())
            .await
    }

    pub async fn update_topics(&self, chat_id: i64, topics: &TopicSet) -> Result<()> {
        self.update_column(chat_id, "topics", topics.to_stored()).await
    }

    pub async fn update_input_state(&self, chat_id: i64, state: InputState) -> Result<()> {
        self.update_column(chat_id, "input_state", state.as_str().to_string())
            .await
    }

    pub async fn update_auto_interval(&self, chat_id: i64, interval: AutoInterval) -> Result<()> {
        let result = sqlx::query("UPDATE users SET auto_interval_sec = $1 WHERE chat_id = $2")
            .bind(interval.as_secs())
            .bind(chat_id)
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;
        Self::require_row(result.rows_affected())
    }

    /// Record that the scheduler processed this chat at `at`.
    pub async fn mark_auto_run(&self, chat_id: i64, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE users SET last_auto_at = $1 WHERE chat_id = $2")
            .bind(at.to_rfc3339())
            .bind(chat_id)
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;
        Self::require_row(result.rows_affected())
    }

    async fn update_column(&self, chat_id: i64, column: &'static str, value: String) -> Result<()> {
        let sql = format!("UPDATE users SET {column} = $1 WHERE chat_id = $2");
        let result = sqlx::query(&sql)
            .bind(value)
            .bind(chat_id)
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;
        Self::require_row(result.rows_affected())
    }

    fn require_row(rows_affected: u64) -> Result<()> {
        if rows_affected == 0 {
            return Err(DigestError::NotFound("user".to_string()));
        }
        Ok(())
    }
}
