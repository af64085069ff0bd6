//! Minimal Telegram Bot API client: `sendMessage` and long-polling `getUpdates`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{OutboundMessage, ParseMode, ReplyKeyboard, Transport};
use crate::config::TelegramConfig;
use crate::{DigestError, Result};

/// Extra time allowed on top of the long-poll timeout.
const POLL_GRACE_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<KeyboardMarkup>,
}

#[derive(Debug, Serialize)]
struct KeyboardMarkup {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
struct KeyboardButton {
    text: String,
}

impl From<&ReplyKeyboard> for KeyboardMarkup {
    fn from(keyboard: &ReplyKeyboard) -> Self {
        Self {
            keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|text| KeyboardButton { text: text.clone() })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        }
    }
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// An incoming update. Only text messages are of interest.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// `(chat_id, text)` if this update is a text message.
    pub fn text_message(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, text))
    }
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(DigestError::Config("telegram.token is not set".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + POLL_GRACE_SECS))
            .build()
            .map_err(|e| DigestError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/bot{}",
                config.api_url.trim_end_matches('/'),
                config.token.trim()
            ),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    async fn call<B: Serialize + ?Sized, T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            .map_err(|e| DigestError::Transport(format!("{method} failed: {}", e.without_url())))?;

        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            DigestError::Transport(format!("{method}: unreadable response ({status}): {e}"))
        })?;

        if !envelope.ok {
            return Err(DigestError::Transport(format!(
                "{method} rejected: {}",
                envelope.description.unwrap_or_else(|| status.to_string())
            )));
        }
        envelope
            .result
            .ok_or_else(|| DigestError::Transport(format!("{method}: missing result")))
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout_secs,
            allowed_updates: ["message"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &request).await?;
        if !updates.is_empty() {
            debug!("Received {} update(s)", updates.len());
        }
        Ok(updates)
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: message.chat_id,
            text: &message.text,
            parse_mode: match message.parse_mode {
                ParseMode::Html => Some("HTML"),
                ParseMode::Plain => None,
            },
            disable_web_page_preview: true,
            reply_markup: message.keyboard.as_ref().map(KeyboardMarkup::from),
        };
        let _: serde_json::Value = self.call("sendMessage", &request).await?;
        Ok(())
    }
}
