use serde_json::{Value, json};

use super::{ContentAggregator, object_mut, pub_time_text, respond};
use crate::fallback::{first_i64, first_str};
use crate::formatters::{format_duration, format_number};
use crate::ids::VideoId;
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{ContentKind, Response, Result};

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    /// Video by BV or av id.
    pub async fn video(&self, id: &str) -> Response {
        respond(ContentKind::Video, self.video_record(id).await)
    }

    async fn video_record(&self, id: &str) -> Result<Value> {
        let id = VideoId::parse(id)?;
        let mut data = self.fetch(&Endpoint::Video(id)).await?;

        let focus = self
            .focus_map(&[("cover", first_str(&data, &["/pic"])), ("avatar", first_str(&data, &["/owner/face"]))])
            .await;
        let duration_text = format_duration(first_i64(&data, &["/duration"]).unwrap_or(0));
        let pub_time = pub_time_text(first_i64(&data, &["/pubdate", "/ctime"]));
        let stat_text = json!({
            "view": format_number(first_i64(&data, &["/stat/view"]).unwrap_or(0)),
            "like": format_number(first_i64(&data, &["/stat/like"]).unwrap_or(0)),
            "reply": format_number(first_i64(&data, &["/stat/reply"]).unwrap_or(0)),
            "danmaku": format_number(first_i64(&data, &["/stat/danmaku"]).unwrap_or(0)),
        });

        let record = object_mut(&mut data, "/data")?;
        record.insert("focus".into(), focus);
        record.insert("duration_text".into(), duration_text.into());
        record.insert("pub_time_text".into(), pub_time.into());
        record.insert("stat_text".into(), stat_text);
        Ok(data)
    }
}
