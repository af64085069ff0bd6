//! Assistant chat handler.

use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::warn;

use crate::news::NewsItem;
use crate::profile::TopicSet;
use crate::web::dto::{AgentChatRequest, AgentChatResponse, ApiResponse, NewsItemResponse, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::news::resolve_topic;
use crate::web::handlers::AppState;

pub const ASSISTANT_DISABLED: &str =
    "The assistant is not configured. Here are the latest headlines instead.";
pub const ASSISTANT_UNAVAILABLE: &str =
    "The assistant is temporarily unavailable. Please try again later.";

/// POST /api/agent/chat - Ask the assistant, with current news as context.
pub async fn agent_chat(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AgentChatRequest>,
) -> Result<Json<ApiResponse<AgentChatResponse>>, ApiError> {
    let topics =
        resolve_topic(state.collector.catalog(), &request.topic).unwrap_or_else(TopicSet::all);

    let items: Vec<NewsItem> = state
        .collector
        .collect(&[], &topics, state.per_feed_limit)
        .await
        .into_iter()
        .take(request.limit as usize)
        .collect();

    let answer = if !state.agent.is_enabled() {
        ASSISTANT_DISABLED.to_string()
    } else {
        match state.agent.reply(&[], &request.message, &items).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Assistant request failed: {}", e);
                ASSISTANT_UNAVAILABLE.to_string()
            }
        }
    };

    Ok(Json(ApiResponse::new(AgentChatResponse {
        answer,
        items: items.iter().map(NewsItemResponse::from).collect(),
    })))
}
