//! Document → HTML rendering.
//!
//! Rendering is a pure function of the module sequence: no I/O, no errors.
//! Only text modules produce markup; metadata modules are read separately
//! by the aggregator. Unknown modules and paragraphs render as nothing.

use crate::document::{ContentDocument, Module, Paragraph, TextNode};
use crate::formatters::text::summarize;

/// Summary length presets, in characters.
pub struct SummaryLimit;

impl SummaryLimit {
    pub const ARTICLE: usize = 2500;
    pub const OPUS: usize = 2000;
}

/// Placeholder used whenever a summary would otherwise be empty.
pub const SUMMARY_PLACEHOLDER: &str = "view details";

/// Width constraint shared by every rendered image.
pub(crate) const IMAGE_STYLE: &str = "max-width:100%;height:auto";

/// Configuration for document rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum number of characters kept in the plain-text summary.
    pub summary_limit: usize,
    /// Text substituted for an empty summary.
    pub placeholder: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { summary_limit: SummaryLimit::OPUS, placeholder: SUMMARY_PLACEHOLDER.to_string() }
    }
}

impl RenderConfig {
    pub fn with_limit(summary_limit: usize) -> Self {
        Self { summary_limit, ..Default::default() }
    }
}

/// HTML body plus its plain-text summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    pub plain_text: String,
}

impl RenderedDocument {
    /// Wraps already-rendered HTML, deriving the summary the same way
    /// [`render_document`] does.
    pub fn from_html(html: String, config: &RenderConfig) -> Self {
        let plain_text = summarize(&html, config.summary_limit, &config.placeholder);
        Self { html, plain_text }
    }
}

/// Renderer with a fixed configuration.
pub struct DocumentRenderer {
    config: RenderConfig,
}

impl DocumentRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, doc: &ContentDocument) -> RenderedDocument {
        render_document(doc, &self.config)
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

/// Renders a document to HTML and a plain-text summary.
pub fn render_document(doc: &ContentDocument, config: &RenderConfig) -> RenderedDocument {
    RenderedDocument::from_html(render_html(doc), config)
}

/// Renders only the HTML body of a document.
pub fn render_html(doc: &ContentDocument) -> String {
    let mut html = String::new();
    for module in &doc.modules {
        match module {
            Module::Text(text) => {
                for paragraph in &text.paragraphs {
                    render_paragraph(paragraph, &mut html);
                }
            }
            Module::Title(_) | Module::Author(_) | Module::Stat(_) | Module::TopMedia(_) | Module::Unknown => {}
        }
    }
    html
}

fn render_paragraph(paragraph: &Paragraph, out: &mut String) {
    match paragraph {
        Paragraph::Text(nodes) => {
            let inner: String = nodes.iter().map(|node| render_node(node, true)).collect();
            if inner.is_empty() {
                out.push_str("<br>");
            } else {
                out.push_str("<p>");
                out.push_str(&inner);
                out.push_str("</p>");
            }
        }
        Paragraph::Image(urls) => {
            for url in urls {
                out.push_str(&format!(r#"<img src="{}" style="{}" />"#, escape_html(url), IMAGE_STYLE));
            }
        }
        Paragraph::Divider => out.push_str("<hr />"),
        Paragraph::Heading { level, nodes } => {
            let level = (*level).clamp(1, 6);
            let inner: String = nodes.iter().map(|node| render_node(node, false)).collect();
            out.push_str(&format!("<h{level}>{inner}</h{level}>"));
        }
        Paragraph::Unknown => {}
    }
}

/// Renders one text run. Headings pass `honor_bold = false`.
fn render_node(node: &TextNode, honor_bold: bool) -> String {
    if node.text.is_empty() {
        return String::new();
    }

    let text = text_to_html(&node.text);

    let mut style = Vec::new();
    if honor_bold && node.bold {
        style.push("font-weight:bold".to_string());
    }
    if let Some(color) = node.color.as_deref().filter(|c| !c.is_empty()) {
        style.push(format!("color:{}", escape_html(color)));
    }

    if style.is_empty() { text } else { format!(r#"<span style="{}">{}</span>"#, style.join(";"), text) }
}

/// Escapes text and turns embedded newlines into line breaks.
pub fn text_to_html(text: &str) -> String {
    escape_html(&text.replace("\r\n", "\n")).replace('\n', "<br>")
}

/// Escapes the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
