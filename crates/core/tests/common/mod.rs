//! In-memory collaborators backed by the JSON fixtures.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;

use bilicard_core::fetch::unwrap_envelope;
use bilicard_core::*;
use serde_json::{Value, json};

pub const RED: [u8; 3] = [255, 0, 0];
pub const GREEN: [u8; 3] = [0, 255, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const GREY: [u8; 3] = [128, 128, 128];

pub fn fixture(name: &str) -> Value {
    let path = format!("../../tests/fixtures/{}", name);
    let raw = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {}: {}", path, e));
    serde_json::from_str(&raw).unwrap()
}

pub fn png(rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb(rgb));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png).unwrap();
    bytes
}

/// Fixture file serving an endpoint, if any.
fn fixture_name(endpoint: &Endpoint) -> Option<&'static str> {
    Some(match endpoint {
        Endpoint::Video(_) => "video_view.json",
        Endpoint::Season(_) | Endpoint::Episode(_) => "season.json",
        Endpoint::MediaReview(_) => "media_review.json",
        Endpoint::Article(1001) => "article_view.json",
        Endpoint::Article(2002) => "article_redirect.json",
        Endpoint::Opus(_) => "opus_detail.json",
        Endpoint::DynamicDetail(_) => "dynamic_detail.json",
        Endpoint::SpaceFeed(_) => "space_feed.json",
        Endpoint::UserCard(_) => "user_card.json",
        Endpoint::RoomByMid(_) => "room_by_mid.json",
        Endpoint::LiveRoom(_) => "live_room.json",
        Endpoint::Nav => "nav.json",
        _ => return None,
    })
}

/// Content client, image fetcher and login transport in one, recording
/// every call it serves.
#[derive(Default)]
pub struct FakeClient {
    /// Endpoint names that fail with a timeout.
    pub failing: Vec<&'static str>,
    /// When set, every image fetch fails.
    pub images_down: bool,
    /// When set, the space feed comes back without items.
    pub empty_feed: bool,
    /// Final URL for every short link.
    pub short_target: String,
    pub calls: RefCell<Vec<&'static str>>,
    pub credentials: RefCell<Vec<Option<Credential>>>,
    pub image_calls: RefCell<Vec<String>>,
    pub poll_script: RefCell<VecDeque<PollSignal>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(names: &[&'static str]) -> Self {
        Self { failing: names.to_vec(), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn color_for(url: &str) -> [u8; 3] {
        if url.contains("/face/") {
            BLUE
        } else if url.contains("/garb/card") {
            GREEN
        } else if url.contains("cover") || url.contains("top") {
            RED
        } else {
            GREY
        }
    }
}

impl ContentSource for FakeClient {
    async fn get(&self, endpoint: &Endpoint, credential: Option<&Credential>) -> Result<Value> {
        self.calls.borrow_mut().push(endpoint.name());
        self.credentials.borrow_mut().push(credential.cloned());

        if self.failing.contains(&endpoint.name()) {
            return Err(BiliError::Timeout { timeout: 10 });
        }
        if self.empty_feed && matches!(endpoint, Endpoint::SpaceFeed(_)) {
            return Ok(json!({"has_more": false, "items": []}));
        }
        match fixture_name(endpoint) {
            Some(name) => unwrap_envelope(fixture(name)),
            None => Err(BiliError::Api { code: -404, message: "啥都木有".to_string() }),
        }
    }

    async fn resolve_short_link(&self, _url: &str) -> Result<String> {
        self.calls.borrow_mut().push("short_link");
        Ok(self.short_target.clone())
    }
}

impl ImageFetcher for FakeClient {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        self.image_calls.borrow_mut().push(url.to_string());
        if self.images_down {
            return Err(BiliError::Timeout { timeout: 5 });
        }
        Ok(png(Self::color_for(url)))
    }
}

impl LoginTransport for FakeClient {
    async fn generate(&self) -> Result<QrTicket> {
        Ok(QrTicket {
            url: "https://account.bilibili.com/h5/account-h5/auth/scan-web?qrcode_key=k123".to_string(),
            key: "k123".to_string(),
        })
    }

    async fn poll(&self, _key: &str) -> Result<PollSignal> {
        Ok(self.poll_script.borrow_mut().pop_front().unwrap_or(PollSignal::NotScanned))
    }
}

/// Unwraps a success response's data, failing the test otherwise.
pub fn data(response: Response) -> Value {
    match response {
        Response::Success { data: Some(data), .. } => data,
        other => panic!("expected success with data, got {:?}", other),
    }
}

pub fn error_message(response: Response) -> String {
    match response {
        Response::Error { message, .. } => message,
        other => panic!("expected error, got {:?}", other),
    }
}
