//! Plain HTML rendering of digests.

use crate::news::NewsItem;

/// Header of digests requested by the user.
pub const ON_DEMAND_HEADER: &str = "<b>Latest news</b>";

/// Header of digests sent by the scheduler.
pub const SCHEDULED_HEADER: &str = "<b>News update</b>";

/// Visible text of item links.
pub const LINK_LABEL: &str = "Read more";

/// Escape text for Telegram HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// An anchor whose visible text is `label`, never the URL itself.
pub fn html_link(url: &str, label: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        escape_html(url),
        escape_html(label)
    )
}

/// Cut `text` to at most `max_chars` characters, marking the cut with "…".
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let kept: String = text.chars().take(max_chars - 1).collect();
    format!("{}…", kept.trim_end())
}

/// Cut `text` at the last whole line that fits in `max_chars`, marking the
/// cut with a "…" line. `None` when not even the first line fits.
///
/// Lines are never split, so markup opened and closed on one line stays intact.
pub fn truncate_lines(text: &str, max_chars: usize) -> Option<String> {
    if text.chars().count() <= max_chars {
        return Some(text.to_string());
    }

    // room for the trailing "\n…"
    let budget = max_chars.checked_sub(2)?;
    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0;
    for line in text.lines() {
        let cost = line.chars().count() + usize::from(!kept.is_empty());
        if used + cost > budget {
            break;
        }
        used += cost;
        kept.push(line);
    }

    while kept.last().is_some_and(|line| line.trim().is_empty()) {
        kept.pop();
    }
    if kept.is_empty() {
        return None;
    }
    Some(format!("{}\n…", kept.join("\n")))
}

/// Whether every `<tag>` in `text` is closed in order and no `<` is left
/// dangling. Telegram refuses HTML messages that fail this.
pub fn tags_balanced(text: &str) -> bool {
    let mut open: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('>') else {
            return false;
        };
        let tag = &after[..end];
        rest = &after[end + 1..];

        let (closing, body) = match tag.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, tag),
        };
        let name: String = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect::<String>()
            .to_ascii_lowercase();
        if name.is_empty() || body.contains('<') {
            return false;
        }

        if closing {
            if open.pop().as_deref() != Some(name.as_str()) {
                return false;
            }
        } else {
            open.push(name);
        }
    }

    open.is_empty()
}

/// Render up to `limit` items as a bulleted list under `header`.
pub fn fallback_digest(items: &[NewsItem], header: &str, limit: usize) -> String {
    let mut lines = vec![header.to_string(), String::new()];

    for item in items.iter().take(limit) {
        let title = if item.title.is_empty() {
            "(untitled)"
        } else {
            item.title.as_str()
        };

        let mut line = String::from("• ");
        if !item.topic.is_empty() {
            line.push_str(&format!("<b>{}</b>: ", escape_html(&item.topic)));
        }
        line.push_str(&escape_html(title));
        if !item.link.is_empty() {
            line.push_str(" — ");
            line.push_str(&html_link(&item.link, LINK_LABEL));
        }
        lines.push(line);
    }

    lines.join("\n")
}
