//! Long-polling loop feeding Telegram updates to the handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::handler::BotHandler;
use crate::transport::{TelegramClient, Update};

/// Delay before polling again after a failed request.
const RETRY_DELAY_SECS: u64 = 5;

/// Something that answers one incoming chat message.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    async fn handle(&self, chat_id: i64, text: &str);
}

#[async_trait]
impl MessageHandler for BotHandler {
    async fn handle(&self, chat_id: i64, text: &str) {
        BotHandler::handle(self, chat_id, text).await;
    }
}

/// Runs each chat's messages strictly in arrival order, while different
/// chats are handled concurrently.
///
/// Every message becomes a task that first waits for the previous task of
/// the same chat.
pub struct ChatDispatcher {
    handler: Arc<dyn MessageHandler>,
    tails: HashMap<i64, JoinHandle<()>>,
}

impl ChatDispatcher {
    pub fn new(handler: Arc<dyn MessageHandler>) -> Self {
        Self {
            handler,
            tails: HashMap::new(),
        }
    }

    /// Queue `text` behind the chat's earlier messages.
    pub fn dispatch(&mut self, chat_id: i64, text: String) {
        self.tails.retain(|_, task| !task.is_finished());

        let previous = self.tails.remove(&chat_id);
        let handler = Arc::clone(&self.handler);
        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    warn!("Chat {}: earlier message task failed: {}", chat_id, e);
                }
            }
            handler.handle(chat_id, &text).await;
        });
        self.tails.insert(chat_id, task);
    }

    /// Chats with a message still being handled.
    pub fn busy_chats(&self) -> usize {
        self.tails.values().filter(|task| !task.is_finished()).count()
    }

    /// Wait until every queued message has been handled.
    pub async fn drain(&mut self) {
        for (chat_id, task) in self.tails.drain() {
            if let Err(e) = task.await {
                warn!("Chat {}: message task failed: {}", chat_id, e);
            }
        }
    }
}

/// Pulls updates and hands them to the per-chat dispatcher.
pub struct UpdatePoller {
    client: Arc<TelegramClient>,
    dispatcher: ChatDispatcher,
    retry_delay: Duration,
}

impl UpdatePoller {
    pub fn new(client: Arc<TelegramClient>, handler: Arc<BotHandler>) -> Self {
        Self {
            client,
            dispatcher: ChatDispatcher::new(handler),
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
        }
    }

    /// Run forever. Polling errors are logged and retried after a short delay.
    pub async fn run(&mut self) {
        info!("Telegram polling started");
        let mut offset = 0;

        loop {
            match self.client.get_updates(offset).await {
                Ok(updates) => {
                    offset = self.dispatch(&updates, offset);
                }
                Err(e) => {
                    warn!("Polling Telegram failed: {}", e);
                    sleep(self.retry_delay).await;
                }
            }
        }
    }

    fn dispatch(&mut self, updates: &[Update], offset: i64) -> i64 {
        let mut next = offset;
        for update in updates {
            next = next.max(update.update_id + 1);
            match update.text_message() {
                Some((chat_id, text)) => self.dispatcher.dispatch(chat_id, text.to_string()),
                None => debug!("Skipping non-text update {}", update.update_id),
            }
        }
        if self.dispatcher.busy_chats() > 0 {
            debug!("{} chat(s) busy", self.dispatcher.busy_chats());
        }
        next
    }
}

/// Spawn the poller on the runtime.
pub fn start_poller(mut poller: UpdatePoller) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        poller.run().await;
    })
}
