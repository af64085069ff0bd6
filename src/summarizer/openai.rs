//! OpenAI-compatible chat completions backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::api_types::{ApiErrorBody, ApiMessage, ChatCompletionRequest, ChatCompletionResponse};
use super::{ChatAgent, Summarizer};
use crate::config::LlmConfig;
use crate::digest::render::{truncate_chars, truncate_lines};
use crate::history::{ChatMessage, ChatRole};
use crate::news::NewsItem;
use crate::{DigestError, Result};

const SELECT_PROMPT: &str = "You select news items for a reader. \
You receive a numbered list of news items and the reader's keywords. \
Reply with a JSON array of the numbers of the relevant items, most relevant first, \
and nothing else. Example: [3, 1, 7]";

const RENDER_PROMPT: &str = "You write short news digests for a Telegram channel. \
Write in the language of the news items. For every item give one or two sentences \
and finish with a link written as <a href=\"URL\">Read more</a>. \
Use only Telegram HTML: <b>, <i> and <a href>. No markdown.";

const CHAT_PROMPT: &str = "You are the assistant of a news bot. Answer briefly and to \
the point, in the language of the user. When news items are provided, rely on them \
and mention that the information comes from the latest headlines.";

/// Characters of a summary included per item in prompts.
const SUMMARY_PREVIEW_CHARS: usize = 300;

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_input_chars: usize,
    max_output_chars: usize,
}

impl OpenAiClient {
    /// Create a client. `max_output_chars` bounds rendered digests.
    pub fn new(config: &LlmConfig, max_output_chars: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| DigestError::Summarizer(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_input_chars: config.max_input_chars,
            max_output_chars,
        })
    }

    async fn complete(&self, messages: Vec<ApiMessage>, temperature: f32) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.api_url);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(temperature),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DigestError::Summarizer(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(DigestError::Summarizer(format!(
                "API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DigestError::Summarizer(format!("failed to parse response: {e}")))?;

        completion
            .first_text()
            .ok_or_else(|| DigestError::Summarizer("empty response".to_string()))
    }
}

#[async_trait]
impl Summarizer for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn select(
        &self,
        candidates: &[NewsItem],
        keywords: &[String],
        max_keep: usize,
    ) -> Result<Vec<NewsItem>> {
        if keywords.is_empty() || candidates.is_empty() {
            return Ok(candidates.iter().take(max_keep).cloned().collect());
        }

        let prompt = format!(
            "Keywords: {}\nKeep at most {} items.\n\n{}",
            keywords.join(", "),
            max_keep,
            numbered_items(candidates, self.max_input_chars)
        );
        let reply = self
            .complete(
                vec![ApiMessage::system(SELECT_PROMPT), ApiMessage::user(prompt)],
                0.0,
            )
            .await?;
        debug!("Selection reply: {}", reply);

        let indexes = parse_selection(&reply, candidates.len(), max_keep)?;
        Ok(indexes.into_iter().map(|i| candidates[i].clone()).collect())
    }

    async fn render(&self, items: &[NewsItem], keywords: &[String]) -> Result<String> {
        if items.is_empty() {
            return Err(DigestError::Summarizer("nothing to render".to_string()));
        }

        let mut prompt = String::new();
        if !keywords.is_empty() {
            prompt.push_str(&format!("Reader keywords: {}\n\n", keywords.join(", ")));
        }
        prompt.push_str(&numbered_items(items, self.max_input_chars));

        let text = self
            .complete(
                vec![ApiMessage::system(RENDER_PROMPT), ApiMessage::user(prompt)],
                0.3,
            )
            .await?;
        truncate_lines(&text, self.max_output_chars).ok_or_else(|| {
            DigestError::Summarizer(format!(
                "digest does not fit in {} characters",
                self.max_output_chars
            ))
        })
    }
}

#[async_trait]
impl ChatAgent for OpenAiClient {
    async fn reply(
        &self,
        history: &[ChatMessage],
        message: &str,
        context: &[NewsItem],
    ) -> Result<String> {
        let mut messages = vec![ApiMessage::system(CHAT_PROMPT)];
        if !context.is_empty() {
            messages.push(ApiMessage::system(format!(
                "Latest news:\n{}",
                numbered_items(context, self.max_input_chars)
            )));
        }
        messages.extend(history.iter().map(|m| match m.role {
            ChatRole::User => ApiMessage::user(&m.content),
            ChatRole::Assistant => ApiMessage::assistant(&m.content),
        }));
        messages.push(ApiMessage::user(message));

        self.complete(messages, 0.5).await
    }
}

/// Number items from 1 for prompts, stopping before `budget` characters.
fn numbered_items(items: &[NewsItem], budget: usize) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let mut line = format!("{}. [{}] {}", i + 1, item.topic, item.title);
        if !item.summary.is_empty() && item.summary != item.title {
            line.push_str(" - ");
            line.push_str(&truncate_chars(&item.summary, SUMMARY_PREVIEW_CHARS));
        }
        line.push_str(&format!(" ({})\n", item.link));

        if !out.is_empty() && out.chars().count() + line.chars().count() > budget {
            break;
        }
        out.push_str(&line);
    }
    out
}

/// Parse a selection reply: a JSON array of 1-based item numbers.
///
/// The array may be wrapped in prose or a code fence. Out-of-range and
/// repeated numbers are ignored. A valid reply that selects nothing keeps
/// the first `max_keep` items. Anything else is an error.
pub fn parse_selection(reply: &str, candidate_count: usize, max_keep: usize) -> Result<Vec<usize>> {
    let malformed = || DigestError::Summarizer(format!("malformed selection: {reply:?}"));

    let start = reply.find('[').ok_or_else(malformed)?;
    let end = reply.rfind(']').ok_or_else(malformed)?;
    if end < start {
        return Err(malformed());
    }
    let numbers: Vec<serde_json::Value> =
        serde_json::from_str(&reply[start..=end]).map_err(|_| malformed())?;

    let mut chosen = Vec::new();
    for number in numbers {
        let index = number
            .as_u64()
            .or_else(|| number.as_str().and_then(|s| s.trim().parse().ok()));
        if let Some(index) = index {
            let index = index as usize;
            if (1..=candidate_count).contains(&index) && !chosen.contains(&(index - 1)) {
                chosen.push(index - 1);
            }
        }
        if chosen.len() >= max_keep {
            break;
        }
    }

    if chosen.is_empty() {
        chosen = (0..candidate_count.min(max_keep)).collect();
    }
    Ok(chosen)
}
