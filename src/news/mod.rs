//! News acquisition: topic catalog, feed fetching, normalization and filtering.

pub mod collector;
pub mod fetcher;
pub mod filter;
pub mod normalize;
pub mod sources;
pub mod types;

pub use collector::NewsCollector;
pub use fetcher::{parse_entries, validate_url, FeedFetcher, RssFetcher};
pub use filter::KeywordMatcher;
pub use normalize::{clean_text, normalize_entry};
pub use sources::{google_news_url, FeedSource, TopicCatalog, GOOGLE_NEWS};
pub use types::{NewsItem, RawEntry};
