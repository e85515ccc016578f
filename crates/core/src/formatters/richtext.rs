//! Rich text for feed entries.
//!
//! Feed entries carry `rich_text_nodes` (emoji, mentions, topics, links)
//! rather than a module tree. Each node kind maps to a small inline element;
//! plain nodes are escaped with newlines turned into `<br>`.

use serde_json::Value;

use crate::fallback::first_str;
use crate::formatters::html::{escape_html, text_to_html};

/// Renders rich text nodes, falling back to `raw_text` when there are none.
pub fn render_rich_text(nodes: Option<&Value>, raw_text: &str) -> String {
    match nodes.and_then(Value::as_array) {
        Some(nodes) if !nodes.is_empty() => nodes.iter().map(render_rich_node).collect(),
        _ => text_to_html(raw_text),
    }
}

fn render_rich_node(node: &Value) -> String {
    let text = first_str(node, &["/text", "/orig_text"]).unwrap_or_default();
    let kind = node.get("type").and_then(Value::as_str).unwrap_or_default();

    match kind {
        "RICH_TEXT_NODE_TYPE_EMOJI" => match first_str(node, &["/emoji/icon_url", "/emoji/gif_url"]) {
            Some(icon) => format!(r#"<img class="emoji" src="{}" alt="{}" />"#, escape_html(icon), escape_html(text)),
            None => escape_html(text),
        },
        "RICH_TEXT_NODE_TYPE_AT" => span("at-user", text),
        "RICH_TEXT_NODE_TYPE_TOPIC" => span("topic-tag", text),
        "RICH_TEXT_NODE_TYPE_VOTE" => span("vote-inline", text),
        "RICH_TEXT_NODE_TYPE_URL" | "RICH_TEXT_NODE_TYPE_BV" => span("link", text),
        _ => text_to_html(text),
    }
}

fn span(class: &str, text: &str) -> String {
    format!(r#"<span class="{}">{}</span>"#, class, escape_html(text))
}
