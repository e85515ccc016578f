use serde_json::{Value, json};

use super::{ContentAggregator, object_mut, pub_time_text, respond};
use crate::document::ContentDocument;
use crate::fallback::{degrade, first_i64, first_present, first_str};
use crate::formatters::{DocumentRenderer, RenderConfig, RenderedDocument, SummaryLimit, format_number};
use crate::ids::{IdKind, parse_number};
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::source::{ContentSource, Endpoint, ImageFetcher};
use crate::{BiliError, ContentKind, Response, Result};

/// A rendered long-form post with the upstream item it came from.
struct OpusDocument {
    item: Value,
    document: ContentDocument,
}

impl<S, F> ContentAggregator<S, F>
where
    S: ContentSource,
    F: ImageFetcher,
{
    /// Long-form post by opus id.
    pub async fn opus(&self, id: &str) -> Response {
        respond(ContentKind::Opus, self.opus_record(id).await)
    }

    /// Article by `cv` id.
    ///
    /// Articles that were migrated to opus posts carry a `dyn_id_str`; their
    /// body is rendered from the opus module tree and the record is marked
    /// with `source: "opus"`. The article's own identity and stats are kept.
    pub async fn article(&self, id: &str) -> Response {
        respond(ContentKind::Article, self.article_record(id).await)
    }

    async fn fetch_opus(&self, id: u64) -> Result<OpusDocument> {
        let data = self.fetch(&Endpoint::Opus(id)).await?;
        let item = data.get("item").cloned().ok_or_else(|| BiliError::MissingField("/item".to_string()))?;
        let document = ContentDocument::from_opus_modules(item.get("modules").unwrap_or(&Value::Null));
        Ok(OpusDocument { item, document })
    }

    async fn opus_record(&self, id: &str) -> Result<Value> {
        let id = parse_number(IdKind::Opus, id)?;
        let OpusDocument { item, document } = self.fetch_opus(id).await?;
        let rendered = DocumentRenderer::new(RenderConfig::with_limit(SummaryLimit::OPUS)).render(&document);

        let author = document.author().cloned().unwrap_or_default();
        let stat = document.stat().cloned().unwrap_or_default();
        let cover = document.cover().map(str::to_string);
        let images: Vec<&str> = document.images().collect();

        let focus = self.focus_map(&[("cover", cover.as_deref()), ("avatar", author.face.as_deref())]).await;

        Ok(json!({
            "id": first_str(&item, &["/id_str"]).map(str::to_string).unwrap_or_else(|| id.to_string()),
            "title": document.title().unwrap_or_default(),
            "author": {
                "mid": author.mid,
                "name": author.name,
                "face": author.face,
                "pub_ts": author.pub_ts,
                "pub_time": author.pub_time,
            },
            "pub_time_text": pub_time_text(author.pub_ts),
            "stat": {
                "like": stat.like,
                "comment": stat.comment,
                "forward": stat.forward,
                "favorite": stat.favorite,
            },
            "stat_text": {
                "like": format_number(stat.like),
                "comment": format_number(stat.comment),
                "forward": format_number(stat.forward),
            },
            "cover": cover,
            "images": images,
            "html_content": rendered.html,
            "plain_text": rendered.plain_text,
            "focus": focus,
        }))
    }

    async fn article_record(&self, id: &str) -> Result<Value> {
        let id = parse_number(IdKind::Article, id)?;
        let mut data = self.fetch(&Endpoint::Article(id)).await?;
        let config = RenderConfig::with_limit(SummaryLimit::ARTICLE);

        let redirect = match first_i64(&data, &["/dyn_id_str"]).filter(|id| *id > 0) {
            Some(dyn_id) => degrade("article opus redirect", self.fetch_opus(dyn_id as u64).await),
            None => None,
        };

        let (rendered, doc_cover, source) = match redirect.as_ref().filter(|opus| !opus.document.is_empty()) {
            Some(opus) => {
                let rendered = DocumentRenderer::new(config).render(&opus.document);
                (rendered, opus.document.cover().map(str::to_string), Some("opus"))
            }
            None => {
                let rendered = article_body(&data, &config);
                (rendered, None, None)
            }
        };

        let cover = first_str(&data, &["/banner_url", "/image_urls/0", "/origin_image_urls/0"])
            .map(str::to_string)
            .or(doc_cover);
        let face = first_str(&data, &["/author_face", "/author/face"]).map(str::to_string);
        let focus = self.focus_map(&[("cover", cover.as_deref()), ("avatar", face.as_deref())]).await;
        let pub_time = pub_time_text(first_i64(&data, &["/publish_time", "/ctime"]));
        let stat_text = json!({
            "view": format_number(first_i64(&data, &["/stats/view"]).unwrap_or(0)),
            "like": format_number(first_i64(&data, &["/stats/like"]).unwrap_or(0)),
            "reply": format_number(first_i64(&data, &["/stats/reply"]).unwrap_or(0)),
            "share": format_number(first_i64(&data, &["/stats/share"]).unwrap_or(0)),
        });
        let author_name = first_present(&data, &["/author_name", "/author/name"]).cloned();

        let record = object_mut(&mut data, "/data")?;
        record.remove("content");
        record.insert("html_content".into(), rendered.html.into());
        record.insert("plain_text".into(), rendered.plain_text.into());
        record.insert("cover".into(), cover.into());
        record.insert("focus".into(), focus);
        record.insert("pub_time_text".into(), pub_time.into());
        record.insert("stat_text".into(), stat_text);
        if let Some(name) = author_name {
            record.insert("author_name".into(), name);
        }
        if let Some(source) = source {
            record.insert("source".into(), source.into());
        }
        Ok(data)
    }
}

/// Renders a saved upstream payload without any network access.
///
/// Accepts an opus detail (`{item: {modules}}`, `{modules}` or a bare module
/// array) or an article view (`{opus: {content: {paragraphs}}}` or
/// `{content}`), each with its own summary limit.
pub fn render_payload(payload: &Value) -> Result<(ContentKind, RenderedDocument)> {
    let payload = payload.get("data").filter(|data| data.is_object()).unwrap_or(payload);

    let modules = match payload {
        Value::Array(_) => Some(payload),
        _ => first_present(payload, &["/item/modules", "/modules"]).filter(|m| m.is_array()),
    };
    if let Some(modules) = modules {
        let document = ContentDocument::from_opus_modules(modules);
        let rendered = DocumentRenderer::new(RenderConfig::with_limit(SummaryLimit::OPUS)).render(&document);
        return Ok((ContentKind::Opus, rendered));
    }

    if first_present(payload, &["/opus/content/paragraphs", "/content"]).is_some() {
        let rendered = article_body(payload, &RenderConfig::with_limit(SummaryLimit::ARTICLE));
        return Ok((ContentKind::Article, rendered));
    }

    Err(BiliError::MissingField("/item/modules".to_string()))
}

/// Body of an article without an opus counterpart: the embedded paragraph
/// list when there is one, else the legacy HTML.
fn article_body(data: &Value, config: &RenderConfig) -> RenderedDocument {
    if let Some(paragraphs) = first_present(data, &["/opus/content/paragraphs"])
        && paragraphs.as_array().is_some_and(|p| !p.is_empty())
    {
        let document = ContentDocument::from_paragraphs(paragraphs);
        return DocumentRenderer::new(config.clone()).render(&document);
    }

    let html = first_str(data, &["/content"]).unwrap_or_default();
    RenderedDocument::from_html(preprocess_html(html, &PreprocessConfig::default()), config)
}
