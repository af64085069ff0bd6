//! Database schema and migrations for newsdigest.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: per-chat delivery profile
    r#"
CREATE TABLE users (
    chat_id            INTEGER PRIMARY KEY,
    keywords           TEXT NOT NULL DEFAULT '',   -- comma separated, lowercase
    topics             TEXT NOT NULL DEFAULT '',   -- comma separated topic keys, empty = all
    input_state        TEXT NOT NULL DEFAULT '',   -- '', 'await_keywords', 'await_topics', 'await_interval'
    auto_interval_sec  INTEGER NOT NULL DEFAULT 1800,
    last_auto_at       TEXT,
    created_at         TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: links already delivered to a chat
    r#"
CREATE TABLE seen_links (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id  INTEGER NOT NULL,
    link     TEXT NOT NULL,
    seen_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(chat_id, link)
);
"#,
    // v3: conversation log used as language model context
    r#"
CREATE TABLE chat_history (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id     INTEGER NOT NULL,
    role        TEXT NOT NULL,                     -- 'user' or 'assistant'
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_chat_history_chat_id ON chat_history(chat_id, id);
"#,
];
