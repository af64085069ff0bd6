//! Per-chat delivery profile: keywords, topics, input state and auto-delivery interval.

pub mod repository;
pub mod service;
pub mod types;

pub use repository::ProfileRepository;
pub use service::ProfileService;
pub use types::{
    AutoInterval, InputState, KeywordSet, TopicSet, UserProfile, MIN_AUTO_INTERVAL_SECS,
};
