//! newsdigest - per-chat news digests over Telegram and HTTP.
//!
//! Feeds are polled per topic, filtered by the chat's keywords, checked
//! against the chat's seen-link ledger and delivered as one digest, either
//! on request or on the chat's own schedule.

pub mod bot;
pub mod config;
pub mod db;
pub mod digest;
pub mod error;
pub mod history;
pub mod ledger;
pub mod logging;
pub mod news;
pub mod profile;
pub mod scheduler;
pub mod summarizer;
pub mod transport;
pub mod web;

pub use config::Config;
pub use db::{Database, DbPool};
pub use digest::{DeliveryKind, DeliveryOutcome, DigestService};
pub use error::{DigestError, Result};
pub use ledger::SeenLinkLedger;
pub use news::{NewsCollector, NewsItem};
pub use profile::{ProfileService, UserProfile};
pub use scheduler::DeliveryScheduler;
