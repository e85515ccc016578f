//! Upstream endpoints and the collaborator traits the aggregator fetches
//! through.
//!
//! [`ContentSource`] returns the unwrapped `data` payload of an endpoint,
//! [`ImageFetcher`] returns raw image bytes. The HTTP implementation lives in
//! [`crate::fetch`]; tests substitute in-memory fakes.

use serde_json::Value;

use crate::Result;
use crate::credential::Credential;
use crate::ids::VideoId;

const API: &str = "https://api.bilibili.com";
const LIVE_API: &str = "https://api.live.bilibili.com";

/// One upstream read, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Video(VideoId),
    Season(u64),
    Episode(u64),
    MediaReview(u64),
    Article(u64),
    Opus(u64),
    DynamicDetail(u64),
    SpaceFeed(u64),
    UserCard(u64),
    RoomByMid(u64),
    LiveRoom(u64),
    Nav,
    FingerSpi,
}

impl Endpoint {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Video(_) => "video",
            Endpoint::Season(_) => "season",
            Endpoint::Episode(_) => "episode",
            Endpoint::MediaReview(_) => "media_review",
            Endpoint::Article(_) => "article",
            Endpoint::Opus(_) => "opus",
            Endpoint::DynamicDetail(_) => "dynamic_detail",
            Endpoint::SpaceFeed(_) => "space_feed",
            Endpoint::UserCard(_) => "user_card",
            Endpoint::RoomByMid(_) => "room_by_mid",
            Endpoint::LiveRoom(_) => "live_room",
            Endpoint::Nav => "nav",
            Endpoint::FingerSpi => "finger_spi",
        }
    }

    pub fn url(&self) -> String {
        let path = match self {
            Endpoint::Video(_) => "/x/web-interface/view",
            Endpoint::Season(_) | Endpoint::Episode(_) => "/pgc/view/web/season",
            Endpoint::MediaReview(_) => "/pgc/review/user",
            Endpoint::Article(_) => "/x/article/view",
            Endpoint::Opus(_) => "/x/polymer/web-dynamic/v1/opus/detail",
            Endpoint::DynamicDetail(_) => "/x/polymer/web-dynamic/v1/detail",
            Endpoint::SpaceFeed(_) => "/x/polymer/web-dynamic/v1/feed/space",
            Endpoint::UserCard(_) => "/x/web-interface/card",
            Endpoint::Nav => "/x/web-interface/nav",
            Endpoint::FingerSpi => "/x/frontend/finger/spi",
            Endpoint::RoomByMid(_) => return format!("{}/room/v1/Room/getRoomInfoOld", LIVE_API),
            Endpoint::LiveRoom(_) => return format!("{}/xlive/web-room/v1/index/getInfoByRoom", LIVE_API),
        };
        format!("{}{}", API, path)
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Endpoint::Video(VideoId::Bvid(bvid)) => vec![("bvid", bvid.clone())],
            Endpoint::Video(VideoId::Aid(aid)) => vec![("aid", aid.to_string())],
            Endpoint::Season(id) => vec![("season_id", id.to_string())],
            Endpoint::Episode(id) => vec![("ep_id", id.to_string())],
            Endpoint::MediaReview(id) => vec![("media_id", id.to_string())],
            Endpoint::Article(id) | Endpoint::Opus(id) | Endpoint::DynamicDetail(id) => vec![("id", id.to_string())],
            Endpoint::SpaceFeed(mid) => vec![("host_mid", mid.to_string())],
            Endpoint::UserCard(mid) => vec![("mid", mid.to_string()), ("photo", "true".to_string())],
            Endpoint::RoomByMid(mid) => vec![("mid", mid.to_string())],
            Endpoint::LiveRoom(room) => vec![("room_id", room.to_string())],
            Endpoint::Nav | Endpoint::FingerSpi => Vec::new(),
        }
    }
}

/// Structured content retrieval.
#[allow(async_fn_in_trait)]
pub trait ContentSource {
    /// Fetches an endpoint and returns its unwrapped payload.
    async fn get(&self, endpoint: &Endpoint, credential: Option<&Credential>) -> Result<Value>;

    /// Follows a short link's redirects and returns the final URL.
    async fn resolve_short_link(&self, url: &str) -> Result<String>;
}

/// Raw image retrieval for focus colors.
#[allow(async_fn_in_trait)]
pub trait ImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>>;
}

impl<S: ContentSource> ContentSource for &S {
    async fn get(&self, endpoint: &Endpoint, credential: Option<&Credential>) -> Result<Value> {
        (**self).get(endpoint, credential).await
    }

    async fn resolve_short_link(&self, url: &str) -> Result<String> {
        (**self).resolve_short_link(url).await
    }
}

impl<F: ImageFetcher> ImageFetcher for &F {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        (**self).fetch_image(url).await
    }
}

/// Protocol-relative image URLs (`//i0.hdslb.com/...`) get `https:`.
pub fn absolutize(url: &str) -> String {
    if url.starts_with("//") { format!("https:{}", url) } else { url.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_query_by_kind() {
        assert_eq!(
            Endpoint::Video(VideoId::Bvid("BV1xx411c7mD".into())).query(),
            vec![("bvid", "BV1xx411c7mD".to_string())]
        );
        assert_eq!(Endpoint::Video(VideoId::Aid(7)).query(), vec![("aid", "7".to_string())]);
    }

    #[test]
    fn test_urls() {
        assert_eq!(Endpoint::Episode(1).url(), Endpoint::Season(1).url());
        assert!(Endpoint::LiveRoom(1).url().starts_with("https://api.live.bilibili.com/"));
        assert_eq!(Endpoint::Opus(1).url(), "https://api.bilibili.com/x/polymer/web-dynamic/v1/opus/detail");
    }

    #[test]
    fn test_absolutize() {
        assert_eq!(absolutize("//i0.hdslb.com/a.jpg"), "https://i0.hdslb.com/a.jpg");
        assert_eq!(absolutize("http://x/a.jpg"), "http://x/a.jpg");
    }
}
