//! Splitting of long messages to fit the transport's size limit.

/// Split `text` into chunks of at most `limit` characters.
///
/// Whole lines are packed greedily; a single line longer than `limit` is
/// hard-split. Empty input yields no chunks, and input that already fits
/// yields exactly one chunk. A blank line that lands on a chunk boundary
/// stays as a blank chunk, so joining the chunks with `\n` gives back the
/// trimmed text whenever no line is longer than `limit`.
pub fn split_for_transport(text: &str, limit: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || limit == 0 {
        return Vec::new();
    }
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    let mut has_current = false;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if has_current {
            if current_len + 1 + line_len <= limit {
                current.push('\n');
                current.push_str(line);
                current_len += 1 + line_len;
                continue;
            }
            chunks.push(std::mem::take(&mut current));
        }

        let mut rest = line;
        let mut rest_len = line_len;
        while rest_len > limit {
            let cut = rest
                .char_indices()
                .nth(limit)
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            chunks.push(rest[..cut].to_string());
            rest = &rest[cut..];
            rest_len -= limit;
        }

        current.push_str(rest);
        current_len = rest_len;
        has_current = true;
    }

    if has_current {
        chunks.push(current);
    }
    chunks
}

/// The chunks of `text` that carry something to send.
///
/// Transports refuse empty messages, so blank chunks are skipped.
pub fn sendable_chunks(text: &str, limit: usize) -> Vec<String> {
    split_for_transport(text, limit)
        .into_iter()
        .filter(|chunk| !chunk.trim().is_empty())
        .collect()
}
