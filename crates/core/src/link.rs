//! Platform link detection in free text.
//!
//! # Example
//!
//! ```rust
//! use bilicard_core::link::Link;
//! use bilicard_core::ids::VideoId;
//!
//! let link = Link::detect("look https://www.bilibili.com/video/BV1xx411c7mD?p=2").unwrap();
//! assert_eq!(link, Link::Video(VideoId::Bvid("BV1xx411c7mD".into())));
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::fallback::first_str;
use crate::ids::{IdKind, VideoId, parse_number};

/// Query parameters that only track where a link was shared from.
pub const TRACKING_PARAMS: &[&str] =
    &["spm_id_from", "from_source", "from", "share_source", "share_medium", "bbid", "ts", "vd_source"];

/// A recognized link, already reduced to the identifier it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    Video(VideoId),
    Dynamic(u64),
    Opus(u64),
    Article(u64),
    Season(u64),
    Episode(u64),
    Media(u64),
    Live(u64),
    User(u64),
    /// `b23.tv` short link; must be resolved before it names anything.
    Short(String),
}

#[derive(Clone, Copy)]
enum Pattern {
    Video,
    Dynamic,
    Opus,
    Article,
    Bangumi,
    Media,
    Live,
    Space,
    Short,
}

static PATTERNS: LazyLock<Vec<(Pattern, Regex)>> = LazyLock::new(|| {
    [
        (Pattern::Video, r"(?i)bilibili\.com/video/(BV[0-9A-Za-z]{10}|av\d+)"),
        (Pattern::Dynamic, r"(?i)(?:t\.bilibili\.com|m\.bilibili\.com/dynamic)/(\d+)"),
        (Pattern::Opus, r"(?i)bilibili\.com/opus/(\d+)"),
        (Pattern::Article, r"(?i)bilibili\.com/read/cv(\d+)"),
        (Pattern::Bangumi, r"(?i)bilibili\.com/bangumi/play/((?:ss|ep)\d+)"),
        (Pattern::Media, r"(?i)bilibili\.com/bangumi/media/md(\d+)"),
        (Pattern::Live, r"(?i)live\.bilibili\.com/(\d+)"),
        (Pattern::Space, r"(?i)space\.bilibili\.com/(\d+)"),
        (Pattern::Short, r"(?i)(?:https?://)?b23\.tv/([0-9A-Za-z]+)"),
    ]
    .into_iter()
    .map(|(kind, re)| (kind, Regex::new(re).unwrap()))
    .collect()
});

impl Link {
    /// Finds the earliest recognized link in `text`.
    pub fn detect(text: &str) -> Option<Link> {
        PATTERNS
            .iter()
            .filter_map(|(kind, re)| re.captures(text).map(|caps| (*kind, caps)))
            .filter_map(|(kind, caps)| {
                let start = caps.get(0)?.start();
                Some((start, Self::from_capture(kind, caps.get(0)?.as_str(), &caps[1])?))
            })
            .min_by_key(|(start, _)| *start)
            .map(|(_, link)| link)
    }

    fn from_capture(kind: Pattern, whole: &str, id: &str) -> Option<Link> {
        let number = |kind| parse_number(kind, id).ok();
        match kind {
            Pattern::Video => VideoId::parse(id).ok().map(Link::Video),
            Pattern::Dynamic => number(IdKind::Dynamic).map(Link::Dynamic),
            Pattern::Opus => number(IdKind::Opus).map(Link::Opus),
            Pattern::Article => number(IdKind::Article).map(Link::Article),
            Pattern::Bangumi if id.to_ascii_lowercase().starts_with("ep") => {
                number(IdKind::Episode).map(Link::Episode)
            }
            Pattern::Bangumi => number(IdKind::Season).map(Link::Season),
            Pattern::Media => number(IdKind::Media).map(Link::Media),
            Pattern::Live => number(IdKind::Room).map(Link::Live),
            Pattern::Space => number(IdKind::User).map(Link::User),
            Pattern::Short => {
                let url = if whole.starts_with("http") { whole.to_string() } else { format!("https://{}", whole) };
                Some(Link::Short(url))
            }
        }
    }

    /// Finds a link inside a shared mini-app card payload.
    pub fn detect_in_mini_app(card: &Value) -> Option<Link> {
        let url = first_str(card, &["/meta/detail_1/qqdocurl", "/meta/news/jumpUrl", "/prompt"])?;
        if url.contains("bilibili.com") || url.contains("b23.tv") { Link::detect(url) } else { None }
    }

    pub fn is_short(&self) -> bool {
        matches!(self, Link::Short(_))
    }
}

/// Removes tracking query parameters. Unparseable input is returned as is.
pub fn clean_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !TRACKING_PARAMS.contains(&name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}
