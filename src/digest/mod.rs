//! Digest assembly, rendering, chunking and the delivery pipeline.

pub mod assembler;
pub mod chunk;
pub mod render;
pub mod service;

pub use assembler::{Digest, DigestAssembler, DigestMode};
pub use chunk::{sendable_chunks, split_for_transport};
pub use render::{
    escape_html, fallback_digest, html_link, tags_balanced, truncate_chars, truncate_lines,
};
pub use service::{DeliveryKind, DeliveryOutcome, DigestService};
