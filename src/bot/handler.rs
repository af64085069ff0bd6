//! Conversation handling: commands, menus, settings input and agent chat.

use std::sync::Arc;

use tracing::{error, warn};

use super::command::{parse_input, BotCommand, BotInput};
use super::menu::{self, MenuButton};
use crate::config::Config;
use crate::db::Database;
use crate::digest::{sendable_chunks, DeliveryKind, DeliveryOutcome, DigestService};
use crate::history::{ChatHistoryRepository, ChatRole};
use crate::news::TopicCatalog;
use crate::profile::{AutoInterval, InputState, ProfileService, UserProfile};
use crate::summarizer::ChatAgent;
use crate::transport::{OutboundMessage, ReplyKeyboard, Transport};
use crate::{DigestError, Result};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";
const AGENT_FAILURE: &str = "Could not get a reply from the assistant. Please try again later.";
const WELCOME: &str = "Hello! I am a news monitoring bot.\nUse the menu buttons to control me.";
const HELP: &str = "How to use:\n\
    1) 'Topics': choose topics (or clear them to get every topic).\n\
    2) 'Keywords': filter news by words (or clear them).\n\
    3) 'Latest news': get a digest right now.\n\
    4) Any other text is a conversation with the assistant.";
const ALL_TOPICS_MESSAGE: &str = "Topics cleared: news will come from every topic.";
const INTERVAL_PROMPT: &str = "Enter the interval in minutes (for example: 30):";
const INTERVAL_RETRY: &str = "Enter a number: the interval in minutes (for example: 30).";

/// Handles text messages from one chat at a time.
pub struct BotHandler {
    db: Arc<Database>,
    digests: Arc<DigestService>,
    agent: Arc<dyn ChatAgent>,
    transport: Arc<dyn Transport>,
    default_interval: AutoInterval,
    reset_seen: bool,
    history_limit: usize,
    max_message_length: usize,
}

impl BotHandler {
    pub fn new(
        db: Arc<Database>,
        digests: Arc<DigestService>,
        agent: Arc<dyn ChatAgent>,
        transport: Arc<dyn Transport>,
        config: &Config,
    ) -> Self {
        Self {
            db,
            digests,
            agent,
            transport,
            default_interval: AutoInterval::from_secs(config.scheduler.default_user_interval_secs),
            reset_seen: config.digest.reset_seen_on_preference_change,
            history_limit: config.llm.chat_history_limit,
            max_message_length: config.telegram.max_message_length.max(1),
        }
    }

    fn profiles(&self) -> ProfileService<'_> {
        ProfileService::new(&self.db)
            .with_default_interval(self.default_interval)
            .with_reset_seen(self.reset_seen)
    }

    fn catalog(&self) -> &TopicCatalog {
        self.digests.collector().catalog()
    }

    /// Handle one incoming text message.
    ///
    /// Failures are logged and answered with a generic apology.
    pub async fn handle(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.handle_text(chat_id, text).await {
            error!("Chat {}: failed to handle message: {}", chat_id, e);
            if let Err(e) = self
                .transport
                .send(&OutboundMessage::plain(chat_id, GENERIC_FAILURE))
                .await
            {
                warn!("Chat {}: failed to send failure notice: {}", chat_id, e);
            }
        }
    }

    /// Handle one incoming text message, returning the first failure.
    pub async fn handle_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let input = parse_input(text);
        if input == BotInput::Text(String::new()) {
            return Ok(());
        }

        let profile = self.profiles().ensure(chat_id).await?;

        let text = match input {
            BotInput::Command(command) => return self.handle_command(&profile, command).await,
            BotInput::Text(text) => text,
        };

        match profile.input_state {
            InputState::AwaitingKeywords => return self.receive_keywords(chat_id, &text).await,
            InputState::AwaitingTopics => return self.receive_topics(chat_id, &text).await,
            InputState::AwaitingInterval => return self.receive_interval(chat_id, &text).await,
            InputState::Idle => {}
        }

        match MenuButton::from_text(&text) {
            Some(button) => self.handle_button(&profile, button).await,
            None => self.converse(chat_id, &text).await,
        }
    }

    async fn handle_command(&self, profile: &UserProfile, command: BotCommand) -> Result<()> {
        let chat_id = profile.chat_id;
        match command {
            BotCommand::Start => {
                self.profiles()
                    .set_input_state(chat_id, InputState::Idle)
                    .await?;
                self.reply_with_menu(chat_id, WELCOME, menu::main_menu())
                    .await
            }
            BotCommand::News => self.send_digest(profile).await,
            BotCommand::Help => self.reply_with_menu(chat_id, HELP, menu::main_menu()).await,
            BotCommand::Unknown(_) => {
                self.reply_with_menu(chat_id, "Use the menu buttons.", menu::main_menu())
                    .await
            }
        }
    }

    async fn handle_button(&self, profile: &UserProfile, button: MenuButton) -> Result<()> {
        let chat_id = profile.chat_id;
        match button {
            MenuButton::LatestNews => self.send_digest(profile).await,
            MenuButton::Settings => {
                self.reply_with_menu(chat_id, "Settings:", menu::settings_menu())
                    .await
            }
            MenuButton::Keywords => {
                let current = if profile.keywords.is_empty() {
                    "Keywords: (none)".to_string()
                } else {
                    format!("Keywords: {}", profile.keywords.display())
                };
                self.reply_with_menu(chat_id, &current, menu::keywords_menu())
                    .await
            }
            MenuButton::SetKeywords => {
                self.profiles()
                    .set_input_state(chat_id, InputState::AwaitingKeywords)
                    .await?;
                self.reply(
                    chat_id,
                    "Enter keywords separated by commas (for example: sport, ukraine, technology):",
                )
                .await
            }
            MenuButton::ClearKeywords => {
                self.profiles().clear_keywords(chat_id).await?;
                self.reply_with_menu(
                    chat_id,
                    "Keywords cleared. News will arrive unfiltered.",
                    menu::main_menu(),
                )
                .await
            }
            MenuButton::Topics => {
                self.reply_with_menu(chat_id, &self.topics_text(), menu::topics_menu())
                    .await
            }
            MenuButton::SetTopics => {
                self.profiles()
                    .set_input_state(chat_id, InputState::AwaitingTopics)
                    .await?;
                self.reply(chat_id, &self.topics_text()).await
            }
            MenuButton::ClearTopics => {
                self.profiles().clear_topics(chat_id).await?;
                self.reply_with_menu(chat_id, ALL_TOPICS_MESSAGE, menu::main_menu())
                    .await
            }
            MenuButton::AutoInterval => {
                self.profiles()
                    .set_input_state(chat_id, InputState::AwaitingInterval)
                    .await?;
                self.reply(chat_id, INTERVAL_PROMPT).await
            }
            MenuButton::Help => self.reply_with_menu(chat_id, HELP, menu::main_menu()).await,
            MenuButton::Back => {
                self.reply_with_menu(chat_id, "Main menu:", menu::main_menu())
                    .await
            }
        }
    }

    async fn receive_keywords(&self, chat_id: i64, text: &str) -> Result<()> {
        let profiles = self.profiles();
        let keywords = profiles.set_keywords(chat_id, text).await?;
        profiles.set_input_state(chat_id, InputState::Idle).await?;

        let shown = if keywords.is_empty() {
            "(empty)".to_string()
        } else {
            keywords.display()
        };
        self.reply_with_menu(
            chat_id,
            &format!("Keywords saved: {shown}"),
            menu::main_menu(),
        )
        .await
    }

    async fn receive_topics(&self, chat_id: i64, text: &str) -> Result<()> {
        let profiles = self.profiles();
        if text.trim().eq_ignore_ascii_case("all") {
            profiles.clear_topics(chat_id).await?;
            profiles.set_input_state(chat_id, InputState::Idle).await?;
            return self
                .reply_with_menu(chat_id, ALL_TOPICS_MESSAGE, menu::main_menu())
                .await;
        }

        let topics = profiles.set_topics(chat_id, text, self.catalog()).await?;
        profiles.set_input_state(chat_id, InputState::Idle).await?;

        let shown = if topics.is_all() {
            "(none selected, all topics)".to_string()
        } else {
            topics.display()
        };
        self.reply_with_menu(chat_id, &format!("Topics saved: {shown}"), menu::main_menu())
            .await
    }

    async fn receive_interval(&self, chat_id: i64, text: &str) -> Result<()> {
        let profiles = self.profiles();
        match profiles.set_interval(chat_id, text).await {
            Ok(interval) => {
                profiles.set_input_state(chat_id, InputState::Idle).await?;
                self.reply_with_menu(
                    chat_id,
                    &format!("Auto-delivery interval: {} min.", interval.as_minutes()),
                    menu::main_menu(),
                )
                .await
            }
            Err(DigestError::Validation(_)) => self.reply(chat_id, INTERVAL_RETRY).await,
            Err(e) => Err(e),
        }
    }

    async fn send_digest(&self, profile: &UserProfile) -> Result<()> {
        let chat_id = profile.chat_id;
        let keywords = if profile.keywords.is_empty() {
            "No keywords set.".to_string()
        } else {
            format!("Keywords: {}", profile.keywords.display())
        };
        let topics = if profile.topics.is_all() {
            "No topics set. Sending news from every topic.".to_string()
        } else {
            format!("Topics: {}", profile.topics.display())
        };
        self.reply(chat_id, &format!("{keywords}\n{topics}")).await?;

        match self.digests.deliver(profile, DeliveryKind::OnDemand).await? {
            DeliveryOutcome::NoNews => {
                self.reply(
                    chat_id,
                    "No news found (or sources are temporarily unavailable).",
                )
                .await
            }
            DeliveryOutcome::NothingNew => {
                self.reply(chat_id, "No new news: everything has already been sent.")
                    .await
            }
            DeliveryOutcome::Delivered { .. } => Ok(()),
        }
    }

    async fn converse(&self, chat_id: i64, text: &str) -> Result<()> {
        if !self.agent.is_enabled() {
            return self
                .reply_with_menu(chat_id, "Try the menu buttons.", menu::main_menu())
                .await;
        }

        let history = ChatHistoryRepository::new(self.db.pool(), self.history_limit);
        let earlier = history.recent(chat_id).await?;

        let answer = match self.agent.reply(&earlier, text, &[]).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Chat {}: assistant failed: {}", chat_id, e);
                return self.reply(chat_id, AGENT_FAILURE).await;
            }
        };

        history.append(chat_id, ChatRole::User, text).await?;
        history.append(chat_id, ChatRole::Assistant, &answer).await?;

        for part in sendable_chunks(&answer, self.max_message_length) {
            self.transport
                .send(&OutboundMessage::plain(chat_id, part))
                .await?;
        }
        Ok(())
    }

    fn topics_text(&self) -> String {
        let mut lines = vec!["Available topics:".to_string()];
        for (i, topic) in self.catalog().iter().enumerate() {
            lines.push(format!("{}) {} (key: {})", i + 1, topic.label, topic.key));
        }
        lines.push(String::new());
        lines.push("Enter topic keys separated by commas (for example: sport, technology)".to_string());
        lines.push("Or type: all to select every topic".to_string());
        lines.join("\n")
    }

    async fn reply(&self, chat_id: i64, text: &str) -> Result<()> {
        self.transport
            .send(&OutboundMessage::plain(chat_id, text))
            .await
    }

    async fn reply_with_menu(&self, chat_id: i64, text: &str, keyboard: ReplyKeyboard) -> Result<()> {
        self.transport
            .send(&OutboundMessage::plain(chat_id, text).with_keyboard(keyboard))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopicConfig;
    use crate::history::ChatMessage;
    use crate::ledger::SeenLinkLedger;
    use crate::news::{FeedFetcher, NewsCollector, NewsItem, RawEntry};
    use crate::profile::ProfileRepository;
    use crate::summarizer::DisabledSummarizer;
    use crate::transport::MemoryTransport;
    use async_trait::async_trait;

    struct StaticFetcher(Vec<RawEntry>);

    #[async_trait]
    impl FeedFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<Vec<RawEntry>> {
            Ok(self.0.clone())
        }
    }

    /// Echoes the message and the number of earlier turns.
    struct EchoAgent;

    #[async_trait]
    impl ChatAgent for EchoAgent {
        async fn reply(&self, history: &[ChatMessage], message: &str, _: &[NewsItem]) -> Result<String> {
            Ok(format!("echo({}): {}", history.len(), message))
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl ChatAgent for FailingAgent {
        async fn reply(&self, _: &[ChatMessage], _: &str, _: &[NewsItem]) -> Result<String> {
            Err(DigestError::Summarizer("timeout".to_string()))
        }
    }

    struct Fixture {
        db: Arc<Database>,
        transport: Arc<MemoryTransport>,
        handler: BotHandler,
    }

    impl Fixture {
        fn last_text(&self, chat_id: i64) -> String {
            self.transport
                .sent_to(chat_id)
                .last()
                .map(|m| m.text.clone())
                .unwrap_or_default()
        }

        async fn profile(&self, chat_id: i64) -> UserProfile {
            ProfileRepository::new(self.db.pool())
                .get(chat_id)
                .await
                .unwrap()
                .unwrap()
        }
    }

    async fn fixture(agent: Arc<dyn ChatAgent>) -> Fixture {
        let mut config = Config::default();
        config.news.topics = vec![
            TopicConfig {
                key: "sport".to_string(),
                label: "Sport".to_string(),
                query: "sport".to_string(),
            },
            TopicConfig {
                key: "world".to_string(),
                label: "World".to_string(),
                query: "world".to_string(),
            },
        ];
        let entries = vec![
            RawEntry::new("Football final tonight", "https://n/1"),
            RawEntry::new("Summit in Geneva", "https://n/2"),
        ];

        let db = Arc::new(Database::open_in_memory().await.unwrap());
        let collector = Arc::new(NewsCollector::new(Arc::new(StaticFetcher(entries)), &config.news));
        let transport = Arc::new(MemoryTransport::new());
        let digests = Arc::new(DigestService::new(
            db.clone(),
            collector,
            Arc::new(DisabledSummarizer),
            transport.clone(),
            &config,
        ));
        let handler = BotHandler::new(db.clone(), digests, agent, transport.clone(), &config);
        Fixture {
            db,
            transport,
            handler,
        }
    }

    #[tokio::test]
    async fn test_start_shows_main_menu_and_resets_state() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(1, "Set keywords").await.unwrap();
        assert_eq!(f.profile(1).await.input_state, InputState::AwaitingKeywords);

        f.handler.handle_text(1, "/start").await.unwrap();
        assert_eq!(f.profile(1).await.input_state, InputState::Idle);
        let last = f.transport.sent_to(1).pop().unwrap();
        assert_eq!(last.text, WELCOME);
        assert_eq!(last.keyboard, Some(menu::main_menu()));
    }

    #[tokio::test]
    async fn test_keyword_flow() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(1, "Set keywords").await.unwrap();
        f.handler.handle_text(1, "Football; Geneva").await.unwrap();

        let profile = f.profile(1).await;
        assert_eq!(profile.input_state, InputState::Idle);
        assert_eq!(profile.keywords.as_slice(), ["football", "geneva"]);
        assert_eq!(f.last_text(1), "Keywords saved: football, geneva");

        f.handler.handle_text(1, "Clear keywords").await.unwrap();
        assert!(f.profile(1).await.keywords.is_empty());
    }

    #[tokio::test]
    async fn test_topic_flow_drops_unknown_keys() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(2, "Set topics").await.unwrap();
        assert!(f.last_text(2).contains("2) World (key: world)"));

        f.handler.handle_text(2, "sport, knitting").await.unwrap();
        let profile = f.profile(2).await;
        assert_eq!(profile.topics.keys(), ["sport"]);
        assert_eq!(f.last_text(2), "Topics saved: sport");

        f.handler.handle_text(2, "Set topics").await.unwrap();
        f.handler.handle_text(2, "all").await.unwrap();
        assert!(f.profile(2).await.topics.is_all());
        assert_eq!(f.last_text(2), ALL_TOPICS_MESSAGE);
    }

    #[tokio::test]
    async fn test_invalid_interval_reprompts() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(3, "Auto-delivery interval").await.unwrap();

        f.handler.handle_text(3, "soon").await.unwrap();
        assert_eq!(f.last_text(3), INTERVAL_RETRY);
        assert_eq!(f.profile(3).await.input_state, InputState::AwaitingInterval);

        f.handler.handle_text(3, "0").await.unwrap();
        let profile = f.profile(3).await;
        assert_eq!(profile.input_state, InputState::Idle);
        assert_eq!(profile.auto_interval.as_secs(), 60);
        assert_eq!(f.last_text(3), "Auto-delivery interval: 1 min.");
    }

    #[tokio::test]
    async fn test_news_then_nothing_new() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(4, "/news").await.unwrap();

        let sent = f.transport.sent_to(4);
        assert_eq!(sent.len(), 2);
        assert!(sent[0].text.contains("No keywords set."));
        assert!(sent[1].text.contains("Football final tonight"));

        f.handler.handle_text(4, "Latest news").await.unwrap();
        assert_eq!(f.last_text(4), "No new news: everything has already been sent.");
    }

    #[tokio::test]
    async fn test_news_with_unmatched_keywords() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(5, "Set keywords").await.unwrap();
        f.handler.handle_text(5, "volcano").await.unwrap();
        f.handler.handle_text(5, "/news").await.unwrap();
        assert_eq!(
            f.last_text(5),
            "No news found (or sources are temporarily unavailable)."
        );
    }

    #[tokio::test]
    async fn test_changing_keywords_forgets_seen_links() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(6, "/news").await.unwrap();
        let ledger = SeenLinkLedger::new(f.db.pool());
        assert_eq!(ledger.count(6).await.unwrap(), 2);

        f.handler.handle_text(6, "Set keywords").await.unwrap();
        f.handler.handle_text(6, "football").await.unwrap();
        assert_eq!(ledger.count(6).await.unwrap(), 0);

        f.handler.handle_text(6, "/news").await.unwrap();
        let last = f.last_text(6);
        assert!(last.contains("Football final tonight"));
        assert!(!last.contains("Summit in Geneva"));
    }

    #[tokio::test]
    async fn test_free_text_without_agent_points_to_menu() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(7, "what happened today?").await.unwrap();
        assert_eq!(f.last_text(7), "Try the menu buttons.");
    }

    #[tokio::test]
    async fn test_conversation_uses_history() {
        let f = fixture(Arc::new(EchoAgent)).await;
        f.handler.handle_text(8, "hello").await.unwrap();
        assert_eq!(f.last_text(8), "echo(0): hello");

        f.handler.handle_text(8, "and again").await.unwrap();
        assert_eq!(f.last_text(8), "echo(2): and again");

        let count = ChatHistoryRepository::new(f.db.pool(), 20)
            .count(8)
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_agent_failure_is_generic() {
        let f = fixture(Arc::new(FailingAgent)).await;
        f.handler.handle_text(9, "hello").await.unwrap();
        assert_eq!(f.last_text(9), AGENT_FAILURE);
        let count = ChatHistoryRepository::new(f.db.pool(), 20)
            .count(9)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_handle_reports_failures_generically() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.db.pool().close().await;
        f.handler.handle(10, "/start").await;
        assert_eq!(f.last_text(10), GENERIC_FAILURE);
    }

    #[tokio::test]
    async fn test_empty_text_is_ignored() {
        let f = fixture(Arc::new(DisabledSummarizer)).await;
        f.handler.handle_text(11, "   ").await.unwrap();
        assert!(f.transport.sent().is_empty());
        assert!(ProfileRepository::new(f.db.pool()).get(11).await.unwrap().is_none());
    }
}
