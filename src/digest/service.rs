//! The delivery pipeline: collect, drop seen links, assemble, chunk, send.

use std::sync::Arc;

use tracing::{debug, info};

use super::assembler::{DigestAssembler, DigestMode};
use super::chunk::sendable_chunks;
use super::render::{ON_DEMAND_HEADER, SCHEDULED_HEADER};
use crate::config::Config;
use crate::db::Database;
use crate::history::{ChatHistoryRepository, ChatRole};
use crate::ledger::SeenLinkLedger;
use crate::news::NewsCollector;
use crate::profile::UserProfile;
use crate::summarizer::Summarizer;
use crate::transport::{OutboundMessage, Transport};
use crate::Result;

/// Who asked for the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    /// The user asked for it.
    OnDemand,
    /// The scheduler decided it was due.
    Scheduled,
}

impl DeliveryKind {
    fn header(&self) -> &'static str {
        match self {
            DeliveryKind::OnDemand => ON_DEMAND_HEADER,
            DeliveryKind::Scheduled => SCHEDULED_HEADER,
        }
    }
}

/// Result of one pipeline run for one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// No source produced a matching item.
    NoNews,
    /// Every matching item had already been delivered.
    NothingNew,
    Delivered {
        /// New items the digest was built from.
        candidates: usize,
        /// Messages sent.
        chunks: usize,
        mode: DigestMode,
    },
}

/// Runs the digest pipeline for single profiles.
pub struct DigestService {
    db: Arc<Database>,
    collector: Arc<NewsCollector>,
    assembler: DigestAssembler,
    transport: Arc<dyn Transport>,
    max_message_length: usize,
    history_limit: usize,
    on_demand_per_feed: usize,
    scheduled_per_feed: usize,
}

impl DigestService {
    pub fn new(
        db: Arc<Database>,
        collector: Arc<NewsCollector>,
        summarizer: Arc<dyn Summarizer>,
        transport: Arc<dyn Transport>,
        config: &Config,
    ) -> Self {
        Self {
            db,
            collector,
            assembler: DigestAssembler::new(summarizer, config.digest.items_limit),
            transport,
            max_message_length: config.telegram.max_message_length.max(1),
            history_limit: config.llm.chat_history_limit,
            on_demand_per_feed: config.news.per_feed_limit,
            scheduled_per_feed: config.news.auto_per_feed_limit,
        }
    }

    pub fn collector(&self) -> &NewsCollector {
        &self.collector
    }

    fn per_feed_limit(&self, kind: DeliveryKind) -> usize {
        match kind {
            DeliveryKind::OnDemand => self.on_demand_per_feed,
            DeliveryKind::Scheduled => self.scheduled_per_feed,
        }
    }

    /// Run the pipeline for `profile`.
    ///
    /// Every collected link is recorded as seen, including those the digest
    /// leaves out. Sending stops at the first failed chunk and the error is
    /// returned; links stay recorded.
    pub async fn deliver(&self, profile: &UserProfile, kind: DeliveryKind) -> Result<DeliveryOutcome> {
        let chat_id = profile.chat_id;
        let items = self
            .collector
            .collect(
                profile.keywords.as_slice(),
                &profile.topics,
                self.per_feed_limit(kind),
            )
            .await;
        if items.is_empty() {
            debug!("Chat {}: no matching news", chat_id);
            return Ok(DeliveryOutcome::NoNews);
        }

        let fresh = SeenLinkLedger::new(self.db.pool())
            .filter_new(chat_id, items)
            .await?;

        let digest = match self
            .assembler
            .assemble(&fresh, profile.keywords.as_slice(), kind.header())
            .await
        {
            Some(digest) => digest,
            None => {
                debug!("Chat {}: nothing new", chat_id);
                return Ok(DeliveryOutcome::NothingNew);
            }
        };

        let chunks = sendable_chunks(&digest.text, self.max_message_length);
        for chunk in &chunks {
            self.transport
                .send(&OutboundMessage::html(chat_id, chunk.as_str()))
                .await?;
        }

        ChatHistoryRepository::new(self.db.pool(), self.history_limit)
            .append(chat_id, ChatRole::Assistant, &digest.text)
            .await?;

        info!(
            "Chat {}: delivered {:?} digest from {} new item(s) in {} message(s)",
            chat_id,
            digest.mode,
            digest.candidates,
            chunks.len()
        );
        Ok(DeliveryOutcome::Delivered {
            candidates: digest.candidates,
            chunks: chunks.len(),
            mode: digest.mode,
        })
    }
}
