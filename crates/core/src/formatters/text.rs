use scraper::Html;

/// Convert HTML to plain text by stripping tags
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>()
}

/// Strip markup, cut to `limit` characters, and never return an empty
/// preview: an empty result becomes `placeholder`.
pub fn summarize(html: &str, limit: usize, placeholder: &str) -> String {
    let text = html_to_text(html);
    let truncated = truncate_chars(&text, limit);
    if truncated.trim().is_empty() { placeholder.to_string() } else { truncated.to_string() }
}

/// Cut a string to at most `limit` characters on a char boundary
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
