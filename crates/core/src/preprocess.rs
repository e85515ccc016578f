//! Cleanup of legacy article HTML.
//!
//! Older articles carry a raw HTML body instead of a module tree. Before it
//! is embedded in a record it is stripped of active content and its images
//! are made loadable outside the platform's lazy loader.

use std::sync::LazyLock;

use lol_html::{HtmlRewriter, Settings, comments, element};
use regex::Regex;

use crate::formatters::html::IMAGE_STYLE;
use crate::source::absolutize;

static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").unwrap());

/// Configuration for legacy article cleanup
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove noscript tags
    pub remove_noscript: bool,
    /// Whether to remove iframe tags
    pub remove_iframes: bool,
    /// Whether to remove HTML comments
    pub remove_comments: bool,
    /// Whether to remove elements hidden with inline styles
    pub remove_hidden: bool,
    /// Whether to promote `data-src` and apply the shared image width style
    pub fix_images: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remove_scripts: true,
            remove_styles: true,
            remove_noscript: true,
            remove_iframes: true,
            remove_comments: true,
            remove_hidden: true,
            fix_images: true,
        }
    }
}

/// Clean a legacy article body
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = remove_unwanted_tags(html, config);

    if config.remove_hidden {
        processed = remove_hidden_elements(&processed);
    }

    if config.fix_images {
        processed = fix_media_urls(&processed);
    }

    processed
}

/// Runs one rewrite pass. On any rewriter error the input is returned
/// unchanged.
fn rewrite(html: &str, settings: Settings<'_, '_>) -> String {
    let mut output = String::new();
    let mut rewriter = HtmlRewriter::new(settings, |c: &[u8]| {
        output.push_str(&String::from_utf8_lossy(c));
    });

    if rewriter.write(html.as_bytes()).is_err() || rewriter.end().is_err() {
        return html.to_string();
    }

    output
}

/// Remove script, style, noscript and iframe tags, and comments
fn remove_unwanted_tags(html: &str, config: &PreprocessConfig) -> String {
    let tags = [
        (config.remove_scripts, "script"),
        (config.remove_styles, "style"),
        (config.remove_noscript, "noscript"),
        (config.remove_iframes, "iframe"),
    ];

    let mut element_content_handlers: Vec<_> = tags
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .map(|(_, tag)| {
            element!(tag, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    if config.remove_comments {
        element_content_handlers.push(comments!("*", |c| {
            c.remove();
            Ok(())
        }));
    }

    rewrite(html, Settings { element_content_handlers, ..Default::default() })
}

/// Remove elements with display:none or visibility:hidden styles
fn remove_hidden_elements(html: &str) -> String {
    rewrite(
        html,
        Settings {
            element_content_handlers: vec![element!("[style]", |el| {
                if let Some(style) = el.get_attribute("style")
                    && HIDDEN_STYLE.is_match(&style)
                {
                    el.remove();
                }
                Ok(())
            })],
            ..Default::default()
        },
    )
}

/// Promote lazy-loaded image sources, make protocol-relative URLs absolute,
/// and constrain image width
fn fix_media_urls(html: &str) -> String {
    rewrite(
        html,
        Settings {
            element_content_handlers: vec![
                element!("img", |el| {
                    let src = el.get_attribute("data-src").filter(|s| !s.is_empty()).or_else(|| el.get_attribute("src"));
                    if let Some(src) = src {
                        el.set_attribute("src", &absolutize(&src))?;
                    }
                    el.remove_attribute("data-src");
                    el.remove_attribute("width");
                    el.remove_attribute("height");
                    el.set_attribute("style", IMAGE_STYLE)?;
                    Ok(())
                }),
                element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href")
                        && href.starts_with("//")
                    {
                        el.set_attribute("href", &absolutize(&href))?;
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
    )
}
