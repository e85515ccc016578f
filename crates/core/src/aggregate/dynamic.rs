use serde_json::{Map, Value, json};

use super::{ContentAggregator, pub_time_text, respond};
use crate::fallback::{degrade, first_i64, first_present, first_str};
use crate::formatters::{format_number, render_rich_text};
use crate::ids::{IdKind, parse_number};
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::vote::vote_from_modules;
use crate::{BiliError, ContentKind, Response, Result};

const PINNED_TAG: &str = "置顶";

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    /// Feed entry by id.
    pub async fn dynamic_detail(&self, id: &str) -> Response {
        respond(ContentKind::Dynamic, self.dynamic_record(id).await)
    }

    /// Newest entry of a user's feed, or `data: null` when the feed is empty.
    pub async fn user_dynamic(&self, uid: &str) -> Response {
        let record = async {
            let uid = parse_number(IdKind::User, uid)?;
            let feed = self.fetch(&Endpoint::SpaceFeed(uid)).await?;
            Ok(newest_feed_item(&feed).unwrap_or(Value::Null))
        };
        respond(ContentKind::Dynamic, record.await)
    }

    async fn dynamic_record(&self, id: &str) -> Result<Value> {
        let id = parse_number(IdKind::Dynamic, id)?;
        let data = self.fetch(&Endpoint::DynamicDetail(id)).await?;
        let item = data.get("item").unwrap_or(&data);
        let modules = item.get("modules").ok_or_else(|| BiliError::MissingField("/item/modules".to_string()))?;

        let mut record = entry_body(item);
        record.insert("item".into(), item.clone());
        record.insert("author".into(), self.entry_author(item).await);
        record.insert("stat".into(), entry_stat(modules));
        record.insert("pub_time_text".into(), pub_time_text(first_i64(modules, &["/module_author/pub_ts"])).into());
        if let Some(live) = live_play_info(item) {
            record.insert("live".into(), live);
        }
        if let Some(orig) = item.get("orig").filter(|orig| orig.is_object()) {
            let mut summary = entry_body(orig);
            summary.insert("author".into(), entry_author_basic(orig));
            record.insert("orig".into(), Value::Object(summary));
        }
        Ok(Value::Object(record))
    }

    /// Author block with decoration and colors. The level comes from a
    /// separate user card lookup and is left out when that fails.
    async fn entry_author(&self, item: &Value) -> Value {
        let mut author = match entry_author_basic(item) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let deco = decoration(item);
        let mid = first_i64(item, &["/modules/module_author/mid"]).filter(|mid| *mid > 0);

        if let Some(mid) = mid
            && let Some(card) = degrade("author level", self.fetch(&Endpoint::UserCard(mid as u64)).await)
            && let Some(level) = first_i64(&card, &["/card/level_info/current_level"])
        {
            author.insert("level".into(), level.into());
        }

        let avatar_color = match first_str(item, &["/modules/module_author/face"]) {
            Some(face) => self.focus_color(face).await,
            None => None,
        };
        let card_color = match deco.card_url.as_deref() {
            Some(url) => self.focus_color(url).await,
            None => None,
        };

        author.insert("pendant_url".into(), deco.pendant_url.into());
        author.insert("card_url".into(), deco.card_url.into());
        author.insert("card_number".into(), deco.card_number.into());
        author.insert("fan_color".into(), deco.fan_color.into());
        author.insert("card_focus_color".into(), card_color.into());
        author.insert("avatar_focus_color".into(), avatar_color.into());
        Value::Object(author)
    }
}

/// Decoration attached to a feed entry's author.
#[derive(Debug, Default, PartialEq)]
struct Decoration {
    pendant_url: Option<String>,
    card_url: Option<String>,
    card_number: Option<String>,
    fan_color: Option<String>,
}

fn decoration(item: &Value) -> Decoration {
    let owned = |s: Option<&str>| s.map(str::to_string);
    Decoration {
        pendant_url: owned(first_str(item, &["/modules/module_author/pendant/image"])),
        card_url: owned(first_str(
            item,
            &["/modules/module_author/decoration_card/card_url", "/modules/module_author/decorate/card_url"],
        )),
        card_number: owned(first_str(
            item,
            &["/modules/module_author/decoration_card/fan/num_desc", "/modules/module_author/decorate/fan/num_str"],
        )),
        fan_color: owned(first_str(
            item,
            &["/modules/module_author/decoration_card/fan/color", "/modules/module_author/decorate/fan/color"],
        )),
    }
}

fn entry_author_basic(item: &Value) -> Value {
    json!({
        "mid": first_i64(item, &["/modules/module_author/mid"]),
        "name": first_str(item, &["/modules/module_author/name"]),
        "face": first_str(item, &["/modules/module_author/face"]),
        "pub_ts": first_i64(item, &["/modules/module_author/pub_ts"]),
        "pub_time": first_str(item, &["/modules/module_author/pub_time"]),
    })
}

/// Content fields shared by an entry and the entry it forwards.
fn entry_body(item: &Value) -> Map<String, Value> {
    let modules = item.get("modules").unwrap_or(&Value::Null);
    let dynamic = modules.get("module_dynamic").unwrap_or(&Value::Null);

    let (text, nodes) = match dynamic.get("desc").filter(|desc| desc.is_object()) {
        Some(desc) => (first_str(desc, &["/text"]).unwrap_or_default(), desc.get("rich_text_nodes")),
        None => (
            first_str(dynamic, &["/major/opus/summary/text"]).unwrap_or_default(),
            dynamic.pointer("/major/opus/summary/rich_text_nodes"),
        ),
    };
    let video = first_present(dynamic, &["/major/archive"]).cloned();
    let text = match (text.is_empty(), &video) {
        (true, Some(archive)) => first_str(archive, &["/desc"]).unwrap_or_default(),
        _ => text,
    };
    let title = first_str(
        dynamic,
        &["/major/opus/title", "/major/archive/title", "/major/article/title", "/major/common/title"],
    );

    let mut body = Map::new();
    body.insert("id".into(), first_str(item, &["/id_str"]).map(str::to_string).into());
    body.insert("type".into(), first_str(item, &["/type"]).map(str::to_string).into());
    body.insert("title".into(), title.map(str::to_string).into());
    body.insert("text".into(), text.into());
    body.insert("text_html".into(), render_rich_text(nodes, text).into());
    body.insert("images".into(), entry_images(dynamic).into());
    body.insert("video".into(), video.unwrap_or(Value::Null));
    body.insert(
        "vote".into(),
        vote_from_modules(modules).and_then(|v| serde_json::to_value(v).ok()).unwrap_or(Value::Null),
    );
    body
}

/// Image URLs of a picture post or an opus-style entry.
fn entry_images(dynamic: &Value) -> Vec<String> {
    let urls = |pointer: &str, key: &str| -> Option<Vec<String>> {
        let items = dynamic.pointer(pointer)?.as_array()?;
        let urls: Vec<String> = items.iter().filter_map(|i| first_str(i, &[key])).map(str::to_string).collect();
        (!urls.is_empty()).then_some(urls)
    };
    urls("/major/draw/items", "/src").or_else(|| urls("/major/opus/pics", "/url")).unwrap_or_default()
}

fn entry_stat(modules: &Value) -> Value {
    let forward = first_i64(modules, &["/module_stat/forward/count"]).unwrap_or(0);
    let comment = first_i64(modules, &["/module_stat/comment/count"]).unwrap_or(0);
    let like = first_i64(modules, &["/module_stat/like/count"]).unwrap_or(0);
    json!({
        "forward": forward,
        "comment": comment,
        "like": like,
        "forward_text": format_number(forward),
        "comment_text": format_number(comment),
        "like_text": format_number(like),
    })
}

/// Live recommendation entries embed their room as a JSON string.
fn live_play_info(item: &Value) -> Option<Value> {
    let content = first_str(item, &["/modules/module_dynamic/major/live_rcmd/content"])?;
    let parsed: Value = degrade("live_rcmd content", serde_json::from_str(content))?;
    parsed.get("live_play_info").cloned()
}

/// Newest entry of a space feed as `{id, type, modules}`.
///
/// A pinned entry is skipped when any other entry follows it.
pub fn newest_feed_item(feed: &Value) -> Option<Value> {
    let items = feed.get("items")?.as_array()?;
    let is_pinned = |item: &&Value| first_str(item, &["/modules/module_tag/text"]) == Some(PINNED_TAG);
    let newest = items.iter().find(|item| !is_pinned(item)).or_else(|| items.first())?;
    Some(json!({
        "id": newest.get("id_str").cloned().unwrap_or(Value::Null),
        "type": newest.get("type").cloned().unwrap_or(Value::Null),
        "modules": newest.get("modules").cloned().unwrap_or(Value::Null),
    }))
}
