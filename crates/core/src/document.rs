//! Structured content documents.
//!
//! A [`ContentDocument`] is the ordered module list of a long-form post.
//! Upstream encodes modules and paragraphs as loosely typed JSON objects;
//! this module maps them onto closed enums once, so the renderer can match
//! exhaustively. Shapes that are not recognized become `Unknown` and render
//! as nothing.
//!
//! # Example
//!
//! ```rust
//! use bilicard_core::document::ContentDocument;
//! use serde_json::json;
//!
//! let modules = json!([
//!     {"module_type": "MODULE_TYPE_TITLE", "module_title": {"text": "Hello"}},
//!     {"module_type": "MODULE_TYPE_SOMETHING_NEW"}
//! ]);
//! let doc = ContentDocument::from_opus_modules(&modules);
//! assert_eq!(doc.title(), Some("Hello"));
//! assert_eq!(doc.modules.len(), 2);
//! ```

use serde_json::Value;

use crate::fallback::{first_i64, first_str};

/// Ordered module sequence. Output order equals input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentDocument {
    pub modules: Vec<Module>,
}

/// A typed block within a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Module {
    Text(TextModule),
    Title(String),
    Author(AuthorModule),
    Stat(StatModule),
    TopMedia(TopMediaModule),
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextModule {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorModule {
    pub name: Option<String>,
    pub face: Option<String>,
    pub mid: Option<i64>,
    pub pub_ts: Option<i64>,
    pub pub_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatModule {
    pub like: i64,
    pub comment: i64,
    pub forward: i64,
    pub favorite: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopMediaModule {
    pub pics: Vec<String>,
}

/// An inline-content unit within a text module.
#[derive(Debug, Clone, PartialEq)]
pub enum Paragraph {
    Text(Vec<TextNode>),
    Image(Vec<String>),
    Divider,
    Heading { level: u8, nodes: Vec<TextNode> },
    Unknown,
}

/// A run of text with optional inline styling.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub bold: bool,
    pub color: Option<String>,
}

impl TextNode {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), bold: false, color: None }
    }

    pub fn styled(text: impl Into<String>, bold: bool, color: Option<&str>) -> Self {
        Self { text: text.into(), bold, color: color.map(str::to_string) }
    }
}

const PARA_TEXT: i64 = 1;
const PARA_IMAGE: i64 = 2;
const PARA_DIVIDER: i64 = 3;
const PARA_HEADING: i64 = 8;

impl ContentDocument {
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules }
    }

    /// Parses the `modules` array of an opus detail item.
    pub fn from_opus_modules(modules: &Value) -> Self {
        let modules = modules.as_array().map(|items| items.iter().map(parse_module).collect()).unwrap_or_default();
        Self { modules }
    }

    /// Wraps a bare paragraph array (as embedded in article payloads) in a
    /// single text module.
    pub fn from_paragraphs(paragraphs: &Value) -> Self {
        Self { modules: vec![Module::Text(TextModule { paragraphs: parse_paragraphs(paragraphs) })] }
    }

    pub fn title(&self) -> Option<&str> {
        self.modules.iter().find_map(|m| match m {
            Module::Title(text) if !text.is_empty() => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn author(&self) -> Option<&AuthorModule> {
        self.modules.iter().find_map(|m| match m {
            Module::Author(author) => Some(author),
            _ => None,
        })
    }

    pub fn stat(&self) -> Option<&StatModule> {
        self.modules.iter().find_map(|m| match m {
            Module::Stat(stat) => Some(stat),
            _ => None,
        })
    }

    /// Cover image: the first top-media picture, else the first inline image.
    pub fn cover(&self) -> Option<&str> {
        let top = self.modules.iter().find_map(|m| match m {
            Module::TopMedia(top) => top.pics.first().map(String::as_str),
            _ => None,
        });
        top.or_else(|| self.images().next())
    }

    /// All inline image URLs in document order.
    pub fn images(&self) -> impl Iterator<Item = &str> {
        self.modules
            .iter()
            .filter_map(|m| match m {
                Module::Text(text) => Some(text.paragraphs.iter()),
                _ => None,
            })
            .flatten()
            .filter_map(|p| match p {
                Paragraph::Image(urls) => Some(urls.iter().map(String::as_str)),
                _ => None,
            })
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn parse_module(module: &Value) -> Module {
    match module.get("module_type").and_then(Value::as_str) {
        Some("MODULE_TYPE_TITLE") => {
            Module::Title(first_str(module, &["/module_title/text"]).unwrap_or_default().to_string())
        }
        Some("MODULE_TYPE_AUTHOR") => Module::Author(AuthorModule {
            name: first_str(module, &["/module_author/name"]).map(str::to_string),
            face: first_str(module, &["/module_author/face"]).map(str::to_string),
            mid: first_i64(module, &["/module_author/mid"]),
            pub_ts: first_i64(module, &["/module_author/pub_ts"]),
            pub_time: first_str(module, &["/module_author/pub_time"]).map(str::to_string),
        }),
        Some("MODULE_TYPE_CONTENT") => Module::Text(TextModule {
            paragraphs: module
                .pointer("/module_content/paragraphs")
                .map(parse_paragraphs)
                .unwrap_or_default(),
        }),
        Some("MODULE_TYPE_STAT") => Module::Stat(StatModule {
            like: first_i64(module, &["/module_stat/like/count"]).unwrap_or(0),
            comment: first_i64(module, &["/module_stat/comment/count"]).unwrap_or(0),
            forward: first_i64(module, &["/module_stat/forward/count"]).unwrap_or(0),
            favorite: first_i64(module, &["/module_stat/favorite/count"]).unwrap_or(0),
        }),
        Some("MODULE_TYPE_TOP") => Module::TopMedia(TopMediaModule {
            pics: module
                .pointer("/module_top/display/album/pics")
                .map(|pics| collect_urls(pics, "url"))
                .unwrap_or_default(),
        }),
        _ => Module::Unknown,
    }
}

fn parse_paragraphs(paragraphs: &Value) -> Vec<Paragraph> {
    paragraphs.as_array().map(|items| items.iter().map(parse_paragraph).collect()).unwrap_or_default()
}

fn parse_paragraph(paragraph: &Value) -> Paragraph {
    match paragraph.get("para_type").and_then(Value::as_i64) {
        Some(PARA_TEXT) => Paragraph::Text(parse_nodes(paragraph.pointer("/text/nodes"))),
        Some(PARA_IMAGE) => {
            Paragraph::Image(paragraph.pointer("/pic/pics").map(|pics| collect_urls(pics, "url")).unwrap_or_default())
        }
        Some(PARA_DIVIDER) => Paragraph::Divider,
        Some(PARA_HEADING) => Paragraph::Heading {
            level: paragraph
                .pointer("/heading/level")
                .and_then(Value::as_u64)
                .map(|level| level.clamp(1, 6) as u8)
                .unwrap_or(1),
            nodes: parse_nodes(paragraph.pointer("/heading/nodes")),
        },
        _ => Paragraph::Unknown,
    }
}

fn parse_nodes(nodes: Option<&Value>) -> Vec<TextNode> {
    nodes.and_then(Value::as_array).map(|items| items.iter().map(parse_node).collect()).unwrap_or_default()
}

fn parse_node(node: &Value) -> TextNode {
    // Word and rich nodes keep their payload under a key named after the type.
    let body = match node.get("type").and_then(Value::as_str) {
        Some("TEXT_NODE_TYPE_RICH") => node.get("rich"),
        _ => node.get("word"),
    };
    let Some(body) = body else {
        return TextNode::default();
    };

    let text = first_str(body, &["/words", "/text", "/orig_text"]).unwrap_or_default();
    let bold = body.pointer("/style/bold").and_then(Value::as_bool).unwrap_or(false);
    let color = first_str(body, &["/color", "/style/color"]);

    TextNode::styled(text, bold, color)
}

fn collect_urls(items: &Value, key: &str) -> Vec<String> {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(key).and_then(Value::as_str))
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
