pub mod display;
pub mod html;
#[cfg(feature = "markdown")]
pub mod markdown;
pub mod richtext;
pub mod text;

pub use display::{format_duration, format_number, format_pub_time};
pub use html::{DocumentRenderer, RenderConfig, RenderedDocument, SummaryLimit, render_document, render_html};
#[cfg(feature = "markdown")]
pub use markdown::{MarkdownConfig, convert_to_markdown};
pub use richtext::render_rich_text;
pub use text::{html_to_text, summarize};
