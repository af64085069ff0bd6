//! HTTP API tests.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::{topic, EchoAgent, StaticFetcher};
use newsdigest::config::NewsConfig;
use newsdigest::news::{NewsCollector, RawEntry};
use newsdigest::summarizer::{ChatAgent, DisabledSummarizer};
use newsdigest::web::handlers::agent::{ASSISTANT_DISABLED, ASSISTANT_UNAVAILABLE};
use newsdigest::web::handlers::AppState;
use newsdigest::web::middleware::RateLimitState;
use newsdigest::web::router::{create_health_router, create_router};
use newsdigest::{DigestError, NewsItem, Result};
use serde_json::{json, Value};

struct BrokenAgent;

#[async_trait::async_trait]
impl ChatAgent for BrokenAgent {
    async fn reply(
        &self,
        _: &[newsdigest::history::ChatMessage],
        _: &str,
        _: &[NewsItem],
    ) -> Result<String> {
        Err(DigestError::Summarizer("HTTP 500: upstream exploded".to_string()))
    }
}

fn news_config() -> NewsConfig {
    NewsConfig {
        topics: vec![topic("sport", "Sport"), topic("technology", "Technology")],
        ..NewsConfig::default()
    }
}

fn fetcher() -> StaticFetcher {
    StaticFetcher::default()
        .with_feed(
            "q=sport&",
            vec![
                RawEntry::new("Cup final tonight", "https://news.test/sport/1")
                    .with_summary("<p>Kick-off at <b>20:00</b></p>"),
                RawEntry::new("Tennis star retires", "https://news.test/sport/2"),
            ],
        )
        .with_feed(
            "q=technology&",
            vec![RawEntry::new("New Rust release", "https://news.test/tech/1")],
        )
}

fn create_test_server(agent: Arc<dyn ChatAgent>, chat_rate_limit: u32) -> TestServer {
    let collector = Arc::new(NewsCollector::new(Arc::new(fetcher()), &news_config()));
    let state = Arc::new(AppState::new(collector, agent));
    let router = create_router(state, Arc::new(RateLimitState::new(chat_rate_limit)), &[])
        .merge(create_health_router());
    TestServer::new(router).expect("Failed to create test server")
}

#[tokio::test]
async fn test_health() {
    let server = create_test_server(Arc::new(DisabledSummarizer), 10);
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_topics_lead_with_all() {
    let server = create_test_server(Arc::new(DisabledSummarizer), 10);
    let response = server.get("/api/topics").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let keys: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["all", "sport", "technology"]);
    assert_eq!(body["data"][1]["label"], "Sport");
}

#[tokio::test]
async fn test_news_for_all_topics() {
    let server = create_test_server(Arc::new(DisabledSummarizer), 10);
    let response = server.get("/api/news").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(body["data"]["meta"]["topic"], "all");
    assert_eq!(body["data"]["meta"]["total"], 3);

    let first = &items[0];
    assert_eq!(first["title"], "Cup final tonight");
    assert_eq!(first["summary"], "Kick-off at 20:00");
    assert_eq!(first["topic"], "Sport");
    assert_eq!(first["source"], "Google News");
    assert_eq!(first["id"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn test_news_topic_keyword_and_limit() {
    let server = create_test_server(Arc::new(DisabledSummarizer), 10);

    let response = server
        .get("/api/news")
        .add_query_param("topic", "sport")
        .add_query_param("limit", 1)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let response = server
        .get("/api/news")
        .add_query_param("q", "rust")
        .await;
    let body: Value = response.json();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["link"], "https://news.test/tech/1");
}

#[tokio::test]
async fn test_news_rejects_unknown_topic_and_bad_limit() {
    let server = create_test_server(Arc::new(DisabledSummarizer), 10);

    let response = server
        .get("/api/news")
        .add_query_param("topic", "knitting")
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let response = server
        .get("/api/news")
        .add_query_param("limit", 0)
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["limit"].is_array());
}

#[tokio::test]
async fn test_agent_chat_without_model_returns_stub_and_items() {
    let server = create_test_server(Arc::new(DisabledSummarizer), 10);
    let response = server
        .post("/api/agent/chat")
        .json(&json!({"message": "What happened in sport?", "topic": "sport", "limit": 5}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["answer"], ASSISTANT_DISABLED);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_agent_chat_passes_news_context() {
    let server = create_test_server(Arc::new(EchoAgent), 10);
    let response = server
        .post("/api/agent/chat")
        .json(&json!({"message": "summarize", "topic": "unknown-topic", "limit": 2}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["answer"], "echo[0 turns, 2 items]: summarize");
}

#[tokio::test]
async fn test_agent_chat_failure_is_generic() {
    let server = create_test_server(Arc::new(BrokenAgent), 10);
    let response = server
        .post("/api/agent/chat")
        .json(&json!({"message": "hello"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"]["answer"], ASSISTANT_UNAVAILABLE);
    assert!(!body.to_string().contains("exploded"));
}

#[tokio::test]
async fn test_agent_chat_requires_message() {
    let server = create_test_server(Arc::new(EchoAgent), 10);
    let response = server
        .post("/api/agent/chat")
        .json(&json!({"message": "   "}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = response.json();
    assert!(body["error"]["details"]["message"].is_array());
}

#[tokio::test]
async fn test_agent_chat_is_rate_limited() {
    let server = create_test_server(Arc::new(EchoAgent), 2);
    for _ in 0..2 {
        server
            .post("/api/agent/chat")
            .json(&json!({"message": "hi"}))
            .await
            .assert_status_ok();
    }

    let response = server
        .post("/api/agent/chat")
        .json(&json!({"message": "hi"}))
        .await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "TOO_MANY_REQUESTS");

    // Other endpoints are not limited.
    server.get("/api/topics").await.assert_status_ok();
}
