//! Identifier validation.
//!
//! Every operation parses its identifier before touching the network, so a
//! malformed id surfaces as [`BiliError::InvalidId`] without a request.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{BiliError, ContentKind, Result};

static BVID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?i:bv)([0-9A-Za-z]{10})$").unwrap());
static PREFIXED_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z]{2})?(\d+)$").unwrap());

/// What an identifier is expected to name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Video,
    Season,
    Episode,
    Media,
    Article,
    Opus,
    Dynamic,
    User,
    Room,
}

impl IdKind {
    /// Canonical two-letter prefix accepted in front of the number.
    fn prefix(self) -> Option<&'static str> {
        match self {
            IdKind::Video => Some("av"),
            IdKind::Season => Some("ss"),
            IdKind::Episode => Some("ep"),
            IdKind::Media => Some("md"),
            IdKind::Article => Some("cv"),
            IdKind::Opus | IdKind::Dynamic | IdKind::User | IdKind::Room => None,
        }
    }

    /// Content kind reported when the id is rejected.
    pub fn content_kind(self) -> ContentKind {
        match self {
            IdKind::Video => ContentKind::Video,
            IdKind::Season | IdKind::Episode | IdKind::Media => ContentKind::Bangumi,
            IdKind::Article => ContentKind::Article,
            IdKind::Opus => ContentKind::Opus,
            IdKind::Dynamic => ContentKind::Dynamic,
            IdKind::User => ContentKind::User,
            IdKind::Room => ContentKind::Live,
        }
    }
}

/// A video is addressed either by its BV string or its legacy av number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoId {
    Bvid(String),
    Aid(u64),
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoId::Bvid(bvid) => f.write_str(bvid),
            VideoId::Aid(aid) => write!(f, "av{}", aid),
        }
    }
}

impl VideoId {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(caps) = BVID.captures(input) {
            return Ok(VideoId::Bvid(format!("BV{}", &caps[1])));
        }
        parse_number(IdKind::Video, input).map(VideoId::Aid)
    }
}

/// Parses a numeric identifier, accepting the kind's canonical prefix
/// (`ss123`, `ep456`, `cv789`, `av42`) in any letter case.
pub fn parse_number(kind: IdKind, input: &str) -> Result<u64> {
    let input = input.trim();
    let invalid = || BiliError::InvalidId { kind: kind.content_kind(), input: input.to_string() };

    let caps = PREFIXED_NUMBER.captures(input).ok_or_else(invalid)?;
    if let Some(prefix) = caps.get(1)
        && kind.prefix().is_none_or(|expected| !prefix.as_str().eq_ignore_ascii_case(expected))
    {
        return Err(invalid());
    }

    match caps[2].parse::<u64>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(n) => Ok(n),
    }
}
