//! Per-chat conversation log, used as language model context.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::db::DbPool;
use crate::{DigestError, Result};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A stored conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    chat_id: i64,
    role: String,
    content: String,
    created_at: String,
}

impl From<ChatMessageRow> for ChatMessage {
    fn from(row: ChatMessageRow) -> Self {
        let role = match row.role.as_str() {
            "assistant" => ChatRole::Assistant,
            _ => ChatRole::User,
        };
        // SQLite datetime('now') has no offset
        let created_at = NaiveDateTime::parse_from_str(&row.created_at, "%Y-%m-%d %H:%M:%S")
            .map(|dt| dt.and_utc())
            .unwrap_or_else(|_| Utc::now());

        Self {
            id: row.id,
            chat_id: row.chat_id,
            role,
            content: row.content,
            created_at,
        }
    }
}

/// Repository for the capped conversation log.
pub struct ChatHistoryRepository<'a> {
    pool: &'a DbPool,
    limit: usize,
}

impl<'a> ChatHistoryRepository<'a> {
    /// Create a repository keeping at most `limit` messages per chat.
    pub fn new(pool: &'a DbPool, limit: usize) -> Self {
        Self { pool, limit }
    }

    /// Append a message and drop the oldest beyond the cap.
    ///
    /// Blank content is not stored. Returns whether a row was written.
    pub async fn append(&self, chat_id: i64, role: ChatRole, content: &str) -> Result<bool> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(false);
        }

        sqlx::query("INSERT INTO chat_history (chat_id, role, content) VALUES ($1, $2, $3)")
            .bind(chat_id)
            .bind(role.as_str())
            .bind(content)
            .execute(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;

        self.trim(chat_id).await?;
        Ok(true)
    }

    /// The most recent messages in chronological order.
    pub async fn recent(&self, chat_id: i64) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, chat_id, role, content, created_at
            FROM chat_history
            WHERE chat_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(chat_id)
        .bind(self.limit as i64)
        .fetch_all(self.pool)
        .await
        .map_err(|e| DigestError::Database(e.to_string()))?;

        let mut messages: Vec<ChatMessage> = rows.into_iter().map(ChatMessage::from).collect();
        messages.reverse();
        Ok(messages)
    }

    pub async fn count(&self, chat_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chat_history WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| DigestError::Database(e.to_string()))?;
        Ok(count)
    }

    async fn trim(&self, chat_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM chat_history
            WHERE chat_id = $1
            AND id NOT IN (
                SELECT id FROM chat_history
                WHERE chat_id = $2
                ORDER BY id DESC
                LIMIT $3
            )
            "#,
        )
        .bind(chat_id)
        .bind(chat_id)
        .bind(self.limit as i64)
        .execute(self.pool)
        .await
        .map_err(|e| DigestError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
