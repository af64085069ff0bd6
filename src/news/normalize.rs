//! Cleaning of raw feed text into plain single-line strings.

use std::sync::OnceLock;

use regex::Regex;

use super::sources::FeedSource;
use super::types::{NewsItem, RawEntry};

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"))
}

/// Strip markup, decode entities and collapse whitespace.
///
/// Total over any input. Unmatched `<` or `>` are left as text.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let without_tags = tag_pattern().replace_all(text, "");
    let decoded = decode_entities(&without_tags).replace('\u{a0}', " ");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn a parsed feed entry into a [`NewsItem`] attributed to `source`.
pub fn normalize_entry(entry: RawEntry, source: &FeedSource) -> NewsItem {
    NewsItem {
        source: source.name.clone(),
        topic: source.topic_label.clone(),
        query: source.query.clone(),
        title: clean_text(entry.title.as_deref().unwrap_or_default()),
        summary: clean_text(entry.summary.as_deref().unwrap_or_default()),
        content: String::new(),
        link: entry.link.unwrap_or_default().trim().to_string(),
        published_at: entry.published_at,
    }
}

fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let decoded = rest
            .find(';')
            .filter(|&end| end > 1 && end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                result.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "laquo" => '«',
        "raquo" => '»',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        "copy" => '©',
        _ => return None,
    };
    Some(ch)
}
