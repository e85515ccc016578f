pub mod aggregate;
pub mod color;
pub mod credential;
pub mod document;
pub mod error;
pub mod fallback;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod formatters;
pub mod ids;
pub mod link;
pub mod login;
pub mod preprocess;
pub mod response;
pub mod service;
pub mod source;
pub mod vote;

pub use aggregate::{ContentAggregator, render_payload};
pub use color::{ColorConfig, ColorConfigBuilder, ColorExtractor, DEFAULT_FOCUS_COLOR, extract_focus_color};
pub use credential::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use document::{ContentDocument, Module, Paragraph, TextNode};
pub use error::{BiliError, Result};
#[cfg(feature = "fetch")]
pub use fetch::{BiliClient, FetchConfig};
pub use formatters::{DocumentRenderer, RenderConfig, RenderedDocument, SummaryLimit, render_document, render_html};
pub use formatters::{format_duration, format_number, format_pub_time};
#[cfg(feature = "markdown")]
pub use formatters::{MarkdownConfig, convert_to_markdown};
pub use ids::{IdKind, VideoId};
pub use link::{Link, clean_url};
pub use login::{LoginSession, LoginState, LoginTransport, PollSignal, QrTicket};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use response::{ContentKind, Response};
pub use service::{Command, Service};
pub use source::{ContentSource, Endpoint, ImageFetcher};
pub use vote::{Vote, VoteItem};
