//! Aggregator integration tests over the JSON fixtures
mod common;

use bilicard_core::*;
use common::{FakeClient, data, error_message};
use serde_json::{Value, json};

fn aggregator(client: &FakeClient) -> ContentAggregator<&FakeClient, &FakeClient> {
    ContentAggregator::new(client, client)
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack.find(needle).unwrap_or_else(|| panic!("{:?} not found in {:?}", needle, haystack))
}

#[tokio::test]
async fn test_opus_record() {
    let client = FakeClient::new();
    let response = aggregator(&client).opus("981234567890123456").await;

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["type"], "opus");

    let record = data(response);
    assert_eq!(record["id"], "981234567890123456");
    assert_eq!(record["title"], "春日散步记录");
    assert_eq!(record["author"]["name"], "散步的猫");
    assert_eq!(record["stat"]["like"], 15321);
    assert_eq!(record["stat_text"]["like"], "1.5万");
    assert_eq!(record["cover"], "https://i0.hdslb.com/bfs/new_dyn/top.jpg");
    assert_eq!(record["images"].as_array().unwrap().len(), 2);
    assert_eq!(record["focus"], json!({"cover": "#ff0000", "avatar": "#0000ff"}));
    assert!(!record["pub_time_text"].as_str().unwrap().is_empty());

    let html = record["html_content"].as_str().unwrap();
    let heading = position(html, "<h2>出发</h2>");
    let text = position(html, "<p>今天天气很好<br>适合散步");
    let divider = position(html, "<hr />");
    let image = position(html, r#"<img src="https://i0.hdslb.com/bfs/new_dyn/a.jpg""#);
    assert!(heading < text && text < divider && divider < image);
    assert!(html.contains(r#"<span style="font-weight:bold;color:#fb7299">重点</span>"#));
    assert!(html.contains("</p><br><hr />"));

    let plain = record["plain_text"].as_str().unwrap();
    assert!(plain.starts_with("出发今天天气很好"));
    assert!(!plain.contains('<'));
}

#[tokio::test]
async fn test_opus_render_is_deterministic() {
    let client = FakeClient::new();
    let first = data(aggregator(&client).opus("981234567890123456").await);
    let second = data(aggregator(&client).opus("981234567890123456").await);
    assert_eq!(first["html_content"], second["html_content"]);
    assert_eq!(first["plain_text"], second["plain_text"]);
}

#[tokio::test]
async fn test_legacy_article() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).article("cv1001").await);

    assert!(record.get("content").is_none());
    assert!(record.get("source").is_none());
    let html = record["html_content"].as_str().unwrap();
    assert!(!html.contains("track()"));
    assert!(!html.contains("隐藏"));
    assert!(html.contains(r#"src="https://i0.hdslb.com/bfs/article/p1.jpg""#));
    assert_eq!(record["plain_text"], "第一段第二段");
    assert_eq!(record["cover"], "https://i0.hdslb.com/bfs/article/banner.jpg");
    assert_eq!(record["focus"], json!({"cover": "#808080", "avatar": "#0000ff"}));
    assert_eq!(record["stat_text"]["view"], "12.3万");
    assert_eq!(client.calls(), vec!["article"]);
}

#[tokio::test]
async fn test_article_redirects_to_opus() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).article("2002").await);

    assert_eq!(record["source"], "opus");
    assert_eq!(record["id"], 2002);
    assert_eq!(record["title"], "迁移到图文的专栏");
    let html = record["html_content"].as_str().unwrap();
    assert!(html.contains("<h2>出发</h2>"));
    assert!(!html.contains("旧正文"));
    assert_eq!(record["cover"], "https://i0.hdslb.com/bfs/article/redirect_banner.jpg");
    assert_eq!(client.calls(), vec!["article", "opus"]);
}

#[tokio::test]
async fn test_article_redirect_failure_keeps_article_body() {
    let client = FakeClient::failing(&["opus"]);
    let record = data(aggregator(&client).article("2002").await);

    assert!(record.get("source").is_none());
    assert_eq!(record["html_content"], "<p>旧正文</p>");
}

#[tokio::test]
async fn test_video_record() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).video("BV1xx411c7mD").await);

    assert_eq!(record["title"], "字幕君交流场所");
    assert_eq!(record["duration_text"], "34:15");
    assert_eq!(record["stat_text"]["view"], "1234.6万");
    assert_eq!(record["focus"], json!({"cover": "#ff0000", "avatar": "#0000ff"}));
    assert!(record["pub_time_text"].as_str().unwrap().starts_with("2009年"));
}

#[tokio::test]
async fn test_invalid_id_fails_before_fetch() {
    let client = FakeClient::new();
    for response in [
        aggregator(&client).video("not-a-video").await,
        aggregator(&client).bangumi("ep12").await,
        aggregator(&client).article("cv0").await,
        aggregator(&client).user_card("abc").await,
    ] {
        assert!(response.is_error());
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn test_primary_fetch_failure_is_an_error() {
    let client = FakeClient::failing(&["video"]);
    let message = error_message(aggregator(&client).video("av2").await);
    assert!(message.contains("timed out"));
}

#[tokio::test]
async fn test_image_failures_degrade_to_default_color() {
    let client = FakeClient { images_down: true, ..FakeClient::new() };
    let record = data(aggregator(&client).video("av2").await);
    assert_eq!(record["focus"], json!({"cover": DEFAULT_FOCUS_COLOR, "avatar": DEFAULT_FOCUS_COLOR}));
}

#[tokio::test]
async fn test_bangumi_record() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).bangumi("ss33415").await);

    assert_eq!(record["status_text"], "2025年1月5日开播 连载中 更新至第7集 每周日 23:00更新");
    assert_eq!(record["meta_suffix"], "日本 原创/奇幻");
    assert_eq!(record["stat_text"]["views"], "2.50亿");
    assert_eq!(record["rating_score"], 9.6);
    assert_eq!(record["focus"], json!({"cover": "#ff0000"}));
}

#[tokio::test]
async fn test_media_resolves_season_first() {
    let client = FakeClient::new();
    let response = aggregator(&client).media("md28229233").await;
    assert_eq!(data(response)["season_id"], 33415);
    assert_eq!(client.calls(), vec!["media_review", "season"]);
}

#[tokio::test]
async fn test_episode_uses_season_payload() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).episode("ep12").await);
    assert_eq!(record["title"], "示例番剧");
    assert_eq!(client.calls(), vec!["episode"]);
}

#[tokio::test]
async fn test_dynamic_detail() {
    let client = FakeClient::new();
    let response = aggregator(&client).dynamic_detail("915000000000000001").await;
    assert_eq!(serde_json::to_value(&response).unwrap()["type"], "dynamic");
    let record = data(response);

    assert_eq!(record["id"], "915000000000000001");
    assert_eq!(
        record["text_html"],
        r#"转发一下 <span class="at-user">@朋友</span><span class="topic-tag">#春天#</span>"#
    );
    assert_eq!(record["vote"]["total"], 11);
    assert_eq!(record["stat"]["like"], 20500);

    let author = &record["author"];
    assert_eq!(author["name"], "散步的猫");
    assert_eq!(author["level"], 6);
    assert_eq!(author["pendant_url"], "https://i0.hdslb.com/bfs/garb/pendant.png");
    assert_eq!(author["card_number"], "000520");
    assert_eq!(author["fan_color"], "#ff7373");
    assert_eq!(author["card_focus_color"], "#00ff00");
    assert_eq!(author["avatar_focus_color"], "#0000ff");

    let orig = &record["orig"];
    assert_eq!(orig["author"]["name"], "朋友");
    assert_eq!(orig["images"], json!(["https://i0.hdslb.com/bfs/new_dyn/flower.jpg"]));
    assert_eq!(orig["text"], "公园的花开了");
}

#[tokio::test]
async fn test_dynamic_author_level_is_best_effort() {
    let client = FakeClient { images_down: true, ..FakeClient::failing(&["user_card"]) };
    let record = data(aggregator(&client).dynamic_detail("915000000000000001").await);

    let author = &record["author"];
    assert!(author.get("level").is_none());
    assert_eq!(author["card_url"], "https://i0.hdslb.com/bfs/garb/card.png");
    assert_eq!(author["avatar_focus_color"], Value::Null);
}

#[tokio::test]
async fn test_user_dynamic_skips_pinned() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).user_dynamic("3493118").await);
    assert_eq!(record["id"], "915000000000000001");
    assert_eq!(record["type"], "DYNAMIC_TYPE_FORWARD");
}

#[tokio::test]
async fn test_user_dynamic_empty_feed_is_null() {
    let client = FakeClient { empty_feed: true, ..FakeClient::new() };
    let response = aggregator(&client).user_dynamic("3493118").await;
    assert_eq!(response.to_json_string(false), r#"{"status":"success","type":"dynamic","data":null}"#);
}

#[tokio::test]
async fn test_user_info() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).user_info("3493118").await);

    assert_eq!(record["name"], "散步的猫");
    assert_eq!(record["level"], 6);
    assert_eq!(record["relation"]["follower"], 120345);
    assert_eq!(record["vip"]["label"], "年度大会员");
    assert_eq!(record["focus"], json!({"avatar": "#0000ff"}));
    assert_eq!(record["dynamic"]["id"], "915000000000000001");
}

#[tokio::test]
async fn test_user_info_without_feed() {
    let client = FakeClient::failing(&["space_feed"]);
    let record = data(aggregator(&client).user_info("3493118").await);
    assert_eq!(record["dynamic"], Value::Null);
    assert_eq!(record["uid"], 3493118);
}

#[tokio::test]
async fn test_user_card_has_no_enrichment() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).user_card("3493118").await);
    assert!(record.get("focus").is_none());
    assert_eq!(record["likes"], 998877);
    assert!(client.image_calls.borrow().is_empty());
}

#[tokio::test]
async fn test_live_room() {
    let client = FakeClient::new();
    let response = aggregator(&client).live_room("21452505").await;
    assert_eq!(serde_json::to_value(&response).unwrap()["type"], "live");
    let record = data(response);

    assert_eq!(record["is_live"], true);
    assert_eq!(record["focus"], json!({"cover": "#ff0000", "avatar": "#0000ff"}));
    assert_eq!(record["summary"]["area"], "生活 · 户外");
    assert_eq!(record["summary"]["watched"], "1.5万人看过");
}

#[tokio::test]
async fn test_user_live() {
    let client = FakeClient::new();
    let record = data(aggregator(&client).user_live("3493118").await);
    assert_eq!(record["is_live"], false);
    assert_eq!(record["roomid"], 21452505);
}

#[tokio::test]
async fn test_credential_is_forwarded() {
    let client = FakeClient::new();
    let credential = Credential::new("sess", "jct", "buvid");
    let response = ContentAggregator::new(&client, &client)
        .with_credential(Some(credential.clone()))
        .video("av2")
        .await;
    assert!(response.is_success());
    assert_eq!(client.credentials.borrow().as_slice(), &[Some(credential)]);
}

#[test]
fn test_render_payload_from_fixture() {
    let (kind, rendered) = render_payload(&common::fixture("opus_detail.json")).unwrap();
    assert_eq!(kind, ContentKind::Opus);
    assert!(rendered.html.starts_with("<h2>出发</h2>"));

    let (kind, rendered) = render_payload(&common::fixture("article_view.json")).unwrap();
    assert_eq!(kind, ContentKind::Article);
    assert_eq!(rendered.plain_text, "第一段第二段");
}
