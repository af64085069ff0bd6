//! Outbound chat transport.

pub mod memory;
pub mod telegram;

use async_trait::async_trait;

use crate::Result;

pub use memory::MemoryTransport;
pub use telegram::{TelegramClient, Update};

/// How the receiving client should interpret message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Html,
}

/// A reply keyboard shown under the input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
}

impl ReplyKeyboard {
    pub fn new(rows: &[&[&str]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|b| b.to_string()).collect())
                .collect(),
        }
    }
}

/// One message to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: ParseMode,
    pub keyboard: Option<ReplyKeyboard>,
}

impl OutboundMessage {
    /// A plain-text message.
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: ParseMode::Plain,
            keyboard: None,
        }
    }

    /// An HTML message.
    pub fn html(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            parse_mode: ParseMode::Html,
            ..Self::plain(chat_id, text)
        }
    }

    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Delivers messages to chats. Failures are reported, never retried.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
}
