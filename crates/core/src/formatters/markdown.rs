use lol_html::{HtmlRewriter, Settings, element};

use crate::{BiliError, Result};

/// Options for turning a rendered document into Markdown
#[derive(Debug, Clone, Default)]
pub struct MarkdownConfig {
    /// Drop images instead of emitting `![](src)`
    pub strip_images: bool,
    /// Heading placed above the body as `# title`
    pub title: Option<String>,
}

/// Convert rendered document HTML to Markdown
pub fn convert_to_markdown(html: &str, config: &MarkdownConfig) -> Result<String> {
    let mut output = String::new();

    if let Some(title) = config.title.as_deref()
        && !title.trim().is_empty()
    {
        output.push_str(&format!("# {}\n\n", title.trim()));
    }

    let body = if config.strip_images { strip_images(html)? } else { html.to_string() };
    output.push_str(&html_to_markdown(&body));

    Ok(output)
}

/// Convert HTML to Markdown using htmd
pub fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).unwrap_or_default()
}

fn strip_images(html: &str) -> Result<String> {
    let mut output = Vec::new();
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![element!("img", |el| {
                el.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| BiliError::HtmlParseError(e.to_string()))?;
    rewriter.end().map_err(|e| BiliError::HtmlParseError(e.to_string()))?;

    String::from_utf8(output).map_err(|e| BiliError::HtmlParseError(e.to_string()))
}
