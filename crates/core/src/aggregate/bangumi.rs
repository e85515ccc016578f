use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Value, json};
use time::PrimitiveDateTime;
use time::macros::format_description;

use super::{ContentAggregator, object_mut, respond};
use crate::fallback::{first_i64, first_present, first_str};
use crate::formatters::display::weekday_name;
use crate::formatters::format_number;
use crate::ids::{IdKind, parse_number};
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{BiliError, ContentKind, Response, Result};

static EPISODE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*").unwrap());
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)").unwrap());

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    /// Season by `ss` id.
    pub async fn bangumi(&self, season: &str) -> Response {
        let record = async {
            let id = parse_number(IdKind::Season, season)?;
            self.season_record(Endpoint::Season(id)).await
        };
        respond(ContentKind::Bangumi, record.await)
    }

    /// Season containing the given `ep` id.
    pub async fn episode(&self, episode: &str) -> Response {
        let record = async {
            let id = parse_number(IdKind::Episode, episode)?;
            self.season_record(Endpoint::Episode(id)).await
        };
        respond(ContentKind::Bangumi, record.await)
    }

    /// Season behind a `md` media id.
    pub async fn media(&self, media: &str) -> Response {
        let record = async {
            let id = parse_number(IdKind::Media, media)?;
            let review = self.fetch(&Endpoint::MediaReview(id)).await?;
            let season_id = first_i64(&review, &["/media/season_id"])
                .filter(|id| *id > 0)
                .ok_or_else(|| BiliError::MissingField("/media/season_id".to_string()))?;
            self.season_record(Endpoint::Season(season_id as u64)).await
        };
        respond(ContentKind::Bangumi, record.await)
    }

    async fn season_record(&self, endpoint: Endpoint) -> Result<Value> {
        let mut data = self.fetch(&endpoint).await?;

        let focus = self.focus_map(&[("cover", first_str(&data, &["/cover", "/square_cover"]))]).await;
        let status = status_text(&data);
        let meta = meta_suffix(&data);
        let stat_text = json!({
            "views": format_number(first_i64(&data, &["/stat/views"]).unwrap_or(0)),
            "follow": format_number(first_i64(&data, &["/stat/follow", "/stat/favorites"]).unwrap_or(0)),
            "danmakus": format_number(first_i64(&data, &["/stat/danmakus"]).unwrap_or(0)),
        });
        let rating = first_present(&data, &["/rating/score"]).cloned().unwrap_or(Value::Null);

        let record = object_mut(&mut data, "/result")?;
        record.insert("focus".into(), focus);
        record.insert("status_text".into(), status.into());
        record.insert("meta_suffix".into(), meta.into());
        record.insert("stat_text".into(), stat_text);
        record.insert("rating_score".into(), rating);
        Ok(data)
    }
}

/// Release and update status line of a season.
///
/// Finished seasons show the release date and the final episode summary;
/// ongoing seasons add the latest episode number and the weekly schedule.
/// Movies and documentaries show only the release date.
pub fn status_text(season: &Value) -> String {
    let release = first_str(season, &["/publish/release_date_show"]).unwrap_or("未知");
    let finished = first_i64(season, &["/publish/is_finish"]) == Some(1);
    let movie_like = is_movie_or_documentary(season);

    let mut parts = vec![format!("{}开播", release)];
    if movie_like {
        return parts.remove(0);
    }

    if finished {
        let desc = first_str(season, &["/new_ep/desc"]).unwrap_or_default();
        let desc = EPISODE_SEPARATOR.replace_all(desc, " ");
        if !desc.trim().is_empty() {
            parts.push(desc.trim().to_string());
        }
    } else {
        parts.push("连载中".to_string());
        if let Some(title) = first_str(season, &["/new_ep/title", "/new_ep/index_show"])
            && let Some(caps) = LEADING_NUMBER.captures(title)
            && let Ok(n) = caps[1].parse::<u64>()
        {
            parts.push(format!("更新至第{}集", n));
        }
        if let Some(schedule) = first_str(season, &["/publish/pub_time"]).and_then(weekly_schedule) {
            parts.push(schedule);
        }
    }

    parts.join(" ")
}

/// `"YYYY-MM-DD HH:MM:SS"` → `"每周X HH:MM更新"`.
fn weekly_schedule(pub_time: &str) -> Option<String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let at = PrimitiveDateTime::parse(pub_time.trim(), format).ok()?;
    Some(format!("每周{} {:02}:{:02}更新", weekday_name(at.weekday()), at.hour(), at.minute()))
}

fn is_movie_or_documentary(season: &Value) -> bool {
    if matches!(first_i64(season, &["/season_type"]), Some(2) | Some(3)) {
        return true;
    }
    let styles = style_names(season);
    if styles.iter().any(|s| *s == "电影" || *s == "纪录片") {
        return true;
    }
    first_str(season, &["/type_desc"]).is_some_and(|desc| desc.contains("电影") || desc.contains("纪录"))
}

/// Style tags appear either as strings or as `{name}` objects.
fn style_names(season: &Value) -> Vec<&str> {
    names(season.get("styles"))
}

fn names(list: Option<&Value>) -> Vec<&str> {
    list.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().or_else(|| first_str(item, &["/name"])))
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Areas and styles, each joined with `/`, separated by a space.
pub fn meta_suffix(season: &Value) -> String {
    let areas = names(season.get("areas")).join("/");
    let styles = style_names(season).join("/");
    [areas, styles].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}
