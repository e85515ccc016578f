//! Error types for bilicard operations.
//!
//! This module defines the main error type [`BiliError`] which represents
//! everything that can go wrong while fetching, decoding, and normalizing
//! a content record. Top-level operations never return it directly: the
//! dispatcher turns it into an `error` [`Response`](crate::Response).
//!
//! # Example
//!
//! ```rust
//! use bilicard_core::{BiliError, Result};
//!
//! fn require_title(title: Option<&str>) -> Result<String> {
//!     title
//!         .map(str::to_string)
//!         .ok_or_else(|| BiliError::MissingField("/title".to_string()))
//! }
//! # assert!(require_title(None).is_err());
//! ```

use thiserror::Error;

use crate::ContentKind;

/// Main error type for content retrieval and normalization.
#[derive(Error, Debug)]
pub enum BiliError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// An identifier that does not match the shape its content kind expects.
    ///
    /// Raised before any network access takes place.
    #[error("Invalid {kind} id: {input:?}")]
    InvalidId { kind: ContentKind, input: String },

    /// The upstream API answered with a non-zero status code.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// A field the operation cannot do without is missing from the payload.
    #[error("Missing field in upstream payload: {0}")]
    MissingField(String),

    /// JSON decoding errors.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// HTML rewriting or parsing errors.
    #[error("Failed to process HTML: {0}")]
    HtmlParseError(String),

    /// Image decoding errors.
    #[error("Image error: {0}")]
    Image(String),

    /// Credential store errors.
    #[error("Credential error: {0}")]
    Credential(String),

    /// File write errors.
    ///
    /// Wraps standard I/O errors for file operations.
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// Text that does not contain a recognized platform link.
    #[error("No supported link found in: {0}")]
    UnsupportedLink(String),
}

impl BiliError {
    /// Upstream status code carried by the error, if any.
    pub fn code(&self) -> Option<i64> {
        match self {
            BiliError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<image::ImageError> for BiliError {
    fn from(err: image::ImageError) -> Self {
        BiliError::Image(err.to_string())
    }
}

/// Result type alias for BiliError.
///
/// This is a convenience alias for `std::result::Result<T, BiliError>`.
pub type Result<T> = std::result::Result<T, BiliError>;
