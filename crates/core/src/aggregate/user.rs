use serde_json::{Value, json};

use super::{ContentAggregator, newest_feed_item, object_mut, respond};
use crate::fallback::{degrade, first_i64, first_str};
use crate::formatters::format_number;
use crate::ids::{IdKind, parse_number};
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{ContentKind, Response, Result};

const VIP_DEFAULT_LABEL: &str = "大会员";

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    /// Normalized profile card.
    pub async fn user_card(&self, uid: &str) -> Response {
        let record = async {
            let uid = parse_number(IdKind::User, uid)?;
            let card = self.fetch(&Endpoint::UserCard(uid)).await?;
            Ok(normalize_user(&card))
        };
        respond(ContentKind::User, record.await)
    }

    /// Profile card with the avatar focus color and the newest feed entry.
    pub async fn user_info(&self, uid: &str) -> Response {
        respond(ContentKind::User, self.user_info_record(uid).await)
    }

    async fn user_info_record(&self, uid: &str) -> Result<Value> {
        let uid = parse_number(IdKind::User, uid)?;
        let card = self.fetch(&Endpoint::UserCard(uid)).await?;
        let mut record = normalize_user(&card);

        let focus = self.focus_map(&[("avatar", first_str(&record, &["/face"]))]).await;
        let dynamic = degrade("user feed", self.fetch(&Endpoint::SpaceFeed(uid)).await)
            .and_then(|feed| newest_feed_item(&feed))
            .unwrap_or(Value::Null);

        let fields = object_mut(&mut record, "/card")?;
        fields.insert("focus".into(), focus);
        fields.insert("dynamic".into(), dynamic);
        Ok(record)
    }
}

/// Flattens a user card payload (`{card, follower, like_num, archive_count}`)
/// into a profile record.
pub fn normalize_user(data: &Value) -> Value {
    let card = data.get("card").unwrap_or(data);

    let follower = first_i64(data, &["/follower"]).or_else(|| first_i64(card, &["/fans"])).unwrap_or(0);
    let following = first_i64(card, &["/attention", "/friend"]).unwrap_or(0);
    let likes = first_i64(data, &["/like_num"]).unwrap_or(0);
    let vip_active = first_i64(card, &["/vip/status", "/vip/vipStatus"]) == Some(1);
    let vip_label = first_str(card, &["/vip/label/text"])
        .map(str::to_string)
        .or_else(|| vip_active.then(|| VIP_DEFAULT_LABEL.to_string()));

    json!({
        "uid": first_i64(card, &["/mid"]),
        "name": first_str(card, &["/name"]).unwrap_or_default(),
        "face": first_str(card, &["/face"]),
        "sign": first_str(card, &["/sign"]).unwrap_or_default(),
        "level": first_i64(card, &["/level_info/current_level", "/level"]).unwrap_or(0),
        "pendant": first_str(card, &["/pendant/image"]),
        "vip": {
            "active": vip_active,
            "label": vip_label,
        },
        "relation": {
            "follower": follower,
            "following": following,
            "follower_text": format_number(follower),
        },
        "likes": likes,
        "likes_text": format_number(likes),
        "archive_count": first_i64(data, &["/archive_count"]).unwrap_or(0),
    })
}
