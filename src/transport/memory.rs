//! In-process transport that records sent messages.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{OutboundMessage, Transport};
use crate::{DigestError, Result};

/// Records every message. Can be told to fail for specific chats.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failing_chats: Mutex<Vec<i64>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `chat_id` fail.
    pub fn fail_for(&self, chat_id: i64) {
        if let Ok(mut failing) = self.failing_chats.lock() {
            failing.push(chat_id);
        }
    }

    /// All messages sent so far.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages sent to one chat.
    pub fn sent_to(&self, chat_id: i64) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let failing = self
            .failing_chats
            .lock()
            .map(|f| f.contains(&message.chat_id))
            .unwrap_or(false);
        if failing {
            return Err(DigestError::Transport(format!(
                "chat {} is unreachable",
                message.chat_id
            )));
        }

        self.sent
            .lock()
            .map_err(|_| DigestError::Transport("transport lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_fails_per_chat() {
        let transport = MemoryTransport::new();
        transport.fail_for(2);

        transport
            .send(&OutboundMessage::plain(1, "one"))
            .await
            .unwrap();
        assert!(transport
            .send(&OutboundMessage::plain(2, "two"))
            .await
            .is_err());

        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.sent_to(1)[0].text, "one");
        assert!(transport.sent_to(2).is_empty());

        transport.clear();
        assert!(transport.sent().is_empty());
    }
}
