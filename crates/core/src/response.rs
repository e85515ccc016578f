//! Response envelope shared by every top-level operation.
//!
//! Callers may depend on `status`, the presence of `type`, and the shape of
//! `data`; everything else is informational.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::BiliError;

/// Kind of content a normalized record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Bangumi,
    Article,
    Opus,
    Dynamic,
    Live,
    User,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Bangumi => "bangumi",
            ContentKind::Article => "article",
            ContentKind::Opus => "opus",
            ContentKind::Dynamic => "dynamic",
            ContentKind::Live => "live",
            ContentKind::User => "user",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one top-level operation, serialized as a flat JSON object
/// tagged by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        kind: Option<ContentKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Only produced by login polling.
    Pending { code: i64, message: String },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<i64>,
        message: String,
    },
}

impl Response {
    /// A normalized content record of the given kind.
    pub fn record(kind: ContentKind, data: Value) -> Self {
        Response::Success { kind: Some(kind), data: Some(data), message: None }
    }

    /// A successful result without a content kind.
    pub fn data(data: Value) -> Self {
        Response::Success { kind: None, data: Some(data), message: None }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Response::Success { kind: None, data: None, message: Some(message.into()) }
    }

    pub fn pending(code: i64, message: impl Into<String>) -> Self {
        Response::Pending { code, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { code: None, message: message.into() }
    }

    pub fn error_with_code(code: i64, message: impl Into<String>) -> Self {
        Response::Error { code: Some(code), message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    /// Serializes the response, compact or pretty-printed.
    pub fn to_json_string(&self, pretty: bool) -> String {
        let encoded = if pretty { serde_json::to_string_pretty(self) } else { serde_json::to_string(self) };
        // Serializing a tree of owned strings and `Value`s cannot fail.
        encoded.unwrap_or_else(|e| format!(r#"{{"status":"error","message":"{}"}}"#, e))
    }
}

impl From<BiliError> for Response {
    fn from(err: BiliError) -> Self {
        Response::Error { code: err.code(), message: err.to_string() }
    }
}

impl<T> From<crate::Result<T>> for Response
where
    T: Into<Response>,
{
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => err.into(),
        }
    }
}
