//! Topic and news listing handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::news::TopicCatalog;
use crate::profile::TopicSet;
use crate::web::dto::{
    ApiResponse, NewsItemResponse, NewsListMeta, NewsListResponse, NewsQuery, TopicResponse,
    ALL_TOPICS,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Resolve a topic parameter. "all" (or nothing) selects every topic.
pub(crate) fn resolve_topic(catalog: &TopicCatalog, topic: &str) -> Option<TopicSet> {
    let topic = topic.trim();
    if topic.is_empty() || topic.eq_ignore_ascii_case(ALL_TOPICS) {
        return Some(TopicSet::all());
    }
    if !catalog.contains(topic) {
        return None;
    }
    Some(TopicSet::parse(topic, catalog))
}

/// GET /api/topics - The topic catalog, led by the synthetic "all" entry.
pub async fn list_topics(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<TopicResponse>>> {
    let mut topics = vec![TopicResponse {
        key: ALL_TOPICS.to_string(),
        label: "All".to_string(),
    }];
    topics.extend(state.collector.catalog().iter().map(|t| TopicResponse {
        key: t.key.clone(),
        label: t.label.clone(),
    }));

    Json(ApiResponse::new(topics))
}

/// GET /api/news - Fresh news for a topic, optionally filtered by a keyword.
pub async fn list_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<ApiResponse<NewsListResponse>>, ApiError> {
    query.validate().map_err(ApiError::from_validation_errors)?;

    let topics = resolve_topic(state.collector.catalog(), &query.topic)
        .ok_or_else(|| ApiError::not_found(format!("Unknown topic: {}", query.topic.trim())))?;

    let keyword = query.q.trim().to_lowercase();
    let keywords: Vec<String> = if keyword.is_empty() {
        Vec::new()
    } else {
        vec![keyword]
    };

    let items = state
        .collector
        .collect(&keywords, &topics, state.per_feed_limit)
        .await;

    let items: Vec<NewsItemResponse> = items
        .iter()
        .take(query.limit as usize)
        .map(NewsItemResponse::from)
        .collect();

    let total = items.len();
    Ok(Json(ApiResponse::new(NewsListResponse {
        items,
        meta: NewsListMeta {
            topic: query.topic,
            query: query.q,
            total,
        },
    })))
}
