//! Router configuration for the HTTP API.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{agent_chat, health_check, list_news, list_topics, AppState};
use super::middleware::{chat_rate_limit, create_cors_layer, RateLimitState};

/// Create the API router.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit_state: Arc<RateLimitState>,
    cors_origins: &[String],
) -> Router {
    let chat_routes = Router::new()
        .route("/agent/chat", post(agent_chat))
        .layer(middleware::from_fn(move |req, next| {
            let state = rate_limit_state.clone();
            chat_rate_limit(state, req, next)
        }));

    let api_routes = Router::new()
        .route("/topics", get(list_topics))
        .route("/news", get(list_news))
        .merge(chat_routes);

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}
