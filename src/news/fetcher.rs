//! Feed fetching with SSRF protection and size limits.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use feed_rs::parser;
use reqwest::Client;

use super::types::RawEntry;
use crate::config::NewsConfig;
use crate::{DigestError, Result};

const MAX_REDIRECTS: usize = 5;

/// Source of raw feed entries.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}

/// HTTP feed fetcher backed by reqwest and feed-rs.
pub struct RssFetcher {
    client: Client,
    max_feed_size: u64,
}

impl RssFetcher {
    /// Create a fetcher using the timeouts and limits in `config`.
    pub fn new(config: &NewsConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| DigestError::Feed(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
        })
    }
}

#[async_trait]
impl FeedFetcher for RssFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        validate_url(url)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DigestError::Feed(format!("failed to fetch feed: {e}")))?;

        if !response.status().is_success() {
            return Err(DigestError::Feed(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Err(DigestError::Feed(format!(
                    "feed too large: {} bytes (max {} bytes)",
                    content_length, self.max_feed_size
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DigestError::Feed(format!("failed to read response: {e}")))?;

        if bytes.len() as u64 > self.max_feed_size {
            return Err(DigestError::Feed(format!(
                "feed too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_feed_size
            )));
        }

        parse_entries(&bytes)
    }
}

/// Parse RSS or Atom bytes into raw entries, in feed order.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<RawEntry>> {
    let feed =
        parser::parse(bytes).map_err(|e| DigestError::Feed(format!("failed to parse feed: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| RawEntry {
            title: entry.title.map(|t| t.content),
            summary: entry
                .summary
                .map(|t| t.content)
                .or(entry.content.and_then(|c| c.body)),
            link: entry.links.first().map(|l| l.href.clone()),
            published_at: entry.published.or(entry.updated),
        })
        .collect())
}

/// Validate a feed URL: http(s) only, no private or local hosts.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed = url::Url::parse(url).map_err(|e| DigestError::Feed(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(DigestError::Feed(format!(
                "unsupported URL scheme: {scheme}"
            )));
        }
    }

    let host = parsed
        .host()
        .ok_or_else(|| DigestError::Feed("URL has no host".to_string()))?;

    let forbidden = match host {
        url::Host::Domain(domain) => is_forbidden_hostname(domain),
        url::Host::Ipv4(ip) => is_private_ip(&IpAddr::V4(ip)),
        url::Host::Ipv6(ip) => is_private_ip(&IpAddr::V6(ip)),
    };
    if forbidden {
        return Err(DigestError::Feed(format!("forbidden host: {host}")));
    }

    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    let host = host.to_lowercase();
    host == "localhost"
        || [".local", ".localhost", ".internal", ".lan", ".home"]
            .iter()
            .any(|suffix| host.ends_with(suffix))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.is_documentation()
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
