//! Shared message formatting helpers for terminal output.

use chrono::{TimeZone, Utc};
use inboxview_core::{group_reactions, Message, MessageBody, MessageBurst};

/// Render a millisecond timestamp as `YYYY-MM-DD HH:MM`.
pub fn format_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One-line display text for a message body.
pub fn body_line(msg: &Message) -> String {
    if msg.is_unsent {
        return "[unsent]".to_string();
    }

    match msg.body() {
        MessageBody::Text(text) => text.replace('\n', " "),
        MessageBody::Photos(photos) => {
            let names: Vec<&str> = photos.iter().map(|p| p.file_name()).collect();
            format!("[photo: {}]", names.join(", "))
        }
        MessageBody::Sticker(sticker) => format!("[sticker: {}]", sticker.file_name()),
        MessageBody::Link { url, text } if text.is_empty() => format!("[link] {url}"),
        MessageBody::Link { url, text } => format!("[link] {url} ({text})"),
    }
}

/// Reaction badges, e.g. `❤ 2  😂 1`.
pub fn reaction_badges(msg: &Message) -> Option<String> {
    let groups = group_reactions(msg);
    if groups.is_empty() {
        return None;
    }
    Some(
        groups
            .iter()
            .map(|g| format!("{} {}", g.reaction, g.count()))
            .collect::<Vec<_>>()
            .join("  "),
    )
}

/// Header line for a burst; the owner's own bursts are marked.
pub fn burst_header(burst: &MessageBurst<'_>, owner: Option<&str>) -> String {
    let marker = match owner {
        Some(owner) if burst.is_from(owner) => " (you)",
        _ => "",
    };
    format!(
        "{}{} · {}",
        burst.sender(),
        marker,
        format_timestamp(burst.started_at())
    )
}
