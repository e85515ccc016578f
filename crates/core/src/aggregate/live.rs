use serde_json::{Value, json};

use super::{ContentAggregator, object_mut, respond};
use crate::fallback::{first_i64, first_present, first_str};
use crate::ids::{IdKind, parse_number};
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{ContentKind, Response, Result};

const LIVE_STATUS_ON_AIR: i64 = 1;

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    /// Live room owned by a user, as reported by the room-by-mid lookup.
    pub async fn user_live(&self, uid: &str) -> Response {
        let record = async {
            let uid = parse_number(IdKind::User, uid)?;
            let mut data = self.fetch(&Endpoint::RoomByMid(uid)).await?;
            let is_live = first_i64(&data, &["/liveStatus", "/live_status"]) == Some(LIVE_STATUS_ON_AIR);
            object_mut(&mut data, "/data")?.insert("is_live".into(), is_live.into());
            Ok(data)
        };
        respond(ContentKind::Live, record.await)
    }

    /// Live room by room id.
    pub async fn live_room(&self, room: &str) -> Response {
        respond(ContentKind::Live, self.live_room_record(room).await)
    }

    async fn live_room_record(&self, room: &str) -> Result<Value> {
        let room = parse_number(IdKind::Room, room)?;
        let mut data = self.fetch(&Endpoint::LiveRoom(room)).await?;

        let focus = self
            .focus_map(&[
                ("cover", first_str(&data, &["/room_info/cover", "/room_info/keyframe"])),
                ("avatar", first_str(&data, &["/anchor_info/base_info/face"])),
            ])
            .await;
        let summary = room_summary(&data);
        let is_live = is_on_air(data.get("room_info"));

        let record = object_mut(&mut data, "/data")?;
        record.insert("focus".into(), focus);
        record.insert("summary".into(), summary);
        record.insert("is_live".into(), is_live.into());
        Ok(data)
    }
}

fn is_on_air(room_info: Option<&Value>) -> bool {
    room_info.and_then(|info| first_i64(info, &["/live_status"])) == Some(LIVE_STATUS_ON_AIR)
}

/// Flat view of the fields a room card shows.
fn room_summary(data: &Value) -> Value {
    let watched = first_present(data, &["/watched_show/text_large", "/watched_show/num"])
        .cloned()
        .unwrap_or_else(|| json!(0));
    let area = [
        first_str(data, &["/room_info/parent_area_name"]),
        first_str(data, &["/room_info/area_name"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" · ");

    json!({
        "room_id": first_i64(data, &["/room_info/room_id"]),
        "title": first_str(data, &["/room_info/title"]).unwrap_or_default(),
        "anchor": first_str(data, &["/anchor_info/base_info/uname"]),
        "watched": watched,
        "area": area,
    })
}
