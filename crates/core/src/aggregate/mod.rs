//! Content aggregation.
//!
//! [`ContentAggregator`] turns one identifier into one normalized record:
//! it fetches the primary payload through a [`ContentSource`], renders
//! document-shaped content, attaches focus colors for image fields, and
//! fills display helpers. Only the primary fetch can fail the request;
//! every enrichment step degrades to an absent field.
//!
//! Operations are split by content kind across the submodules; each adds
//! its own `impl` block.

mod article;
mod bangumi;
mod dynamic;
mod live;
mod user;
mod video;

pub use article::render_payload;
pub use bangumi::{meta_suffix, status_text};
pub use dynamic::newest_feed_item;
pub use user::normalize_user;

use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::color::{ColorConfig, ColorExtractor, DEFAULT_FOCUS_COLOR};
use crate::credential::Credential;
use crate::fallback::degrade;
use crate::formatters::format_pub_time;
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{BiliError, Response, Result};

/// Builds normalized records from upstream payloads.
pub struct ContentAggregator<S, F> {
    source: S,
    images: F,
    colors: ColorExtractor,
    credential: Option<Credential>,
}

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    pub fn new(source: S, images: F) -> Self {
        Self { source, images, colors: ColorExtractor::default(), credential: None }
    }

    /// Credential sent with every content request of this aggregator.
    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_color_config(mut self, config: ColorConfig) -> Self {
        self.colors = ColorExtractor::new(config);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value> {
        self.source.get(endpoint, self.credential.as_ref()).await
    }

    /// Focus color of the image at `url`. Any fetch or decode failure yields
    /// `None`.
    pub async fn focus_color(&self, url: &str) -> Option<String> {
        if url.is_empty() {
            return None;
        }
        let bytes = degrade("focus image", self.images.fetch_image(url).await)?;
        self.colors.extract(&bytes)
    }

    /// Builds a `focus` object. Fields with no URL are left out; fields
    /// whose color could not be determined get the neutral default.
    async fn focus_map(&self, fields: &[(&str, Option<&str>)]) -> Value {
        let mut focus = Map::new();
        for (name, url) in fields {
            let Some(url) = url.filter(|u| !u.is_empty()) else {
                continue;
            };
            let color = self.focus_color(url).await.unwrap_or_else(|| DEFAULT_FOCUS_COLOR.to_string());
            focus.insert((*name).to_string(), Value::String(color));
        }
        Value::Object(focus)
    }
}

/// Wraps a record-building result into a response of the given kind.
fn respond(kind: crate::ContentKind, record: Result<Value>) -> Response {
    match record {
        Ok(data) => Response::record(kind, data),
        Err(e) => {
            tracing::debug!(kind = %kind, error = %e, "operation failed");
            e.into()
        }
    }
}

/// Borrows the payload as an object, or reports the missing shape.
fn object_mut<'a>(value: &'a mut Value, path: &str) -> Result<&'a mut Map<String, Value>> {
    value.as_object_mut().ok_or_else(|| BiliError::MissingField(path.to_string()))
}

/// Relative publish time for a unix timestamp; empty when there is none.
fn pub_time_text(timestamp: Option<i64>) -> String {
    timestamp
        .filter(|ts| *ts > 0)
        .map(|ts| format_pub_time(ts, OffsetDateTime::now_utc()))
        .unwrap_or_default()
}
