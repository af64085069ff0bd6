//! Per-client rate limiting of the assistant endpoint.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    num::NonZeroU32,
    sync::{Arc, RwLock},
    time::Duration,
};

use crate::web::error::ApiError;

/// Rate limiter of one client IP.
pub type IpRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-IP limiters for the chat endpoint.
#[derive(Clone)]
pub struct RateLimitState {
    chat_limiters: Arc<RwLock<HashMap<String, Arc<IpRateLimiter>>>>,
    /// Requests per minute.
    chat_rate_limit: u32,
}

impl RateLimitState {
    pub fn new(chat_rate_limit: u32) -> Self {
        Self {
            chat_limiters: Arc::new(RwLock::new(HashMap::new())),
            chat_rate_limit,
        }
    }

    fn get_or_create_limiter(&self, ip: &str) -> Arc<IpRateLimiter> {
        {
            let read_guard = self
                .chat_limiters
                .read()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(limiter) = read_guard.get(ip) {
                return limiter.clone();
            }
        }

        let mut write_guard = self
            .chat_limiters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Another request may have created it meanwhile.
        if let Some(limiter) = write_guard.get(ip) {
            return limiter.clone();
        }

        let quota =
            Quota::per_minute(NonZeroU32::new(self.chat_rate_limit).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        write_guard.insert(ip.to_string(), limiter.clone());
        limiter
    }

    /// Whether a chat request from `ip` is allowed now.
    pub fn check_chat(&self, ip: &str) -> bool {
        self.get_or_create_limiter(ip).check().is_ok()
    }

    /// Drop limiters nobody holds.
    pub fn cleanup(&self) {
        let mut guard = self
            .chat_limiters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.retain(|_, v| Arc::strong_count(v) > 1);
    }

    /// Clean up every five minutes in the background.
    pub fn start_cleanup_task(self: Arc<Self>) {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(300)).await;
                self.cleanup();
            }
        });
    }
}

/// Extract the client IP, honoring reverse proxy headers.
fn get_client_ip(req: &Request<Body>) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("X-Real-IP")
        .and_then(|v| v.to_str().ok())
    {
        return real_ip.to_string();
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Rate limiting middleware for the chat endpoint.
pub async fn chat_rate_limit(
    state: Arc<RateLimitState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&req);

    if !state.check_chat(&ip) {
        tracing::warn!(ip = %ip, "Chat rate limit exceeded");
        return ApiError::too_many_requests("Too many requests. Please try again later.")
            .into_response();
    }

    next.run(req).await
}
