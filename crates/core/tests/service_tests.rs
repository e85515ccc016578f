mod common;

use bilicard_core::*;
use common::{FakeClient, data, error_message};
use serde_json::json;

fn service(client: FakeClient) -> Service<FakeClient, MemoryCredentialStore> {
    Service::new(client, MemoryCredentialStore::new())
}

async fn login_check(service: &Service<FakeClient, MemoryCredentialStore>) -> Response {
    service.dispatch(Command::LoginCheck("k123".to_string())).await
}

#[tokio::test]
async fn test_short_link_is_resolved_then_fetched() {
    let client = FakeClient {
        short_target: "https://www.bilibili.com/video/BV1xx411c7mD?share_source=copy_web".to_string(),
        ..FakeClient::new()
    };
    let service = service(client);

    let response = service.dispatch(Command::Link("快看 https://b23.tv/aBc123 好看".to_string())).await;
    assert_eq!(serde_json::to_value(&response).unwrap()["type"], "video");
    assert_eq!(data(response)["bvid"], "BV1xx411c7mD");
    assert_eq!(service.client().calls(), vec!["short_link", "video"]);
}

#[tokio::test]
async fn test_short_link_to_another_short_link_is_rejected() {
    let client = FakeClient { short_target: "https://b23.tv/again".to_string(), ..FakeClient::new() };
    let service = service(client);

    let response = service.dispatch(Command::Link("https://b23.tv/aBc123".to_string())).await;
    assert!(error_message(response).contains("No supported link"));
}

#[tokio::test]
async fn test_plain_link_dispatches_by_kind() {
    let service = service(FakeClient::new());

    let response = service.dispatch(Command::Link("https://live.bilibili.com/21452505?from=search".to_string())).await;
    assert_eq!(serde_json::to_value(&response).unwrap()["type"], "live");

    let response = service.dispatch(Command::Link("https://www.bilibili.com/read/cv1001".to_string())).await;
    assert_eq!(data(response)["plain_text"], "第一段第二段");
    assert_eq!(service.client().calls(), vec!["live_room", "article"]);
}

#[tokio::test]
async fn test_text_without_link() {
    let service = service(FakeClient::new());
    let response = service.dispatch(Command::Link("今天也要散步".to_string())).await;
    assert!(error_message(response).contains("No supported link"));
    assert!(service.client().calls().is_empty());
}

#[tokio::test]
async fn test_mini_app_card() {
    let service = service(FakeClient::new());
    let card = json!({
        "app": "com.tencent.miniapp_01",
        "meta": {"detail_1": {"title": "哔哩哔哩", "qqdocurl": "https://www.bilibili.com/opus/981234567890123456"}}
    });

    let response = service.dispatch(Command::Link(card.to_string())).await;
    assert_eq!(data(response)["title"], "春日散步记录");
    assert_eq!(service.client().calls(), vec!["opus"]);
}

#[tokio::test]
async fn test_login_url() {
    let service = service(FakeClient::new());
    let record = data(service.dispatch(Command::LoginUrl).await);
    assert_eq!(record["key"], "k123");
    assert!(record["url"].as_str().unwrap().contains("qrcode_key=k123"));
    assert_eq!(service.store().save_count(), 0);
}

#[tokio::test]
async fn test_login_check_progression() {
    let client = FakeClient::new();
    let credential = Credential::new("sess", "jct", "buvid");
    client.poll_script.borrow_mut().extend([
        PollSignal::NotScanned,
        PollSignal::Scanned,
        PollSignal::Confirmed(credential.clone()),
    ]);
    let service = service(client);

    let waiting = serde_json::to_value(login_check(&service).await).unwrap();
    assert_eq!(waiting["status"], "pending");
    assert_eq!(waiting["code"], 86101);

    let scanned = serde_json::to_value(login_check(&service).await).unwrap();
    assert_eq!(scanned["code"], 86090);
    assert_eq!(service.store().save_count(), 0);

    assert!(login_check(&service).await.is_success());
    assert_eq!(service.store().save_count(), 1);
    assert_eq!(service.store().load(), Some(credential));
}

#[tokio::test]
async fn test_login_check_requires_key() {
    let service = service(FakeClient::new());
    let response = service.dispatch(Command::LoginCheck("  ".to_string())).await;
    assert_eq!(error_message(response), "missing login key");
}

#[tokio::test]
async fn test_expired_login_is_an_error() {
    let client = FakeClient::new();
    client.poll_script.borrow_mut().push_back(PollSignal::Expired);
    let service = service(client);

    let response = serde_json::to_value(service.dispatch(Command::LoginCheck("k123".to_string())).await).unwrap();
    assert_eq!(response["status"], "error");
    assert_eq!(response["code"], 86038);
}

#[tokio::test]
async fn test_stored_credential_reaches_fetch() {
    let credential = Credential::new("sess", "jct", "buvid");
    let service = Service::new(FakeClient::new(), MemoryCredentialStore::with_credential(credential.clone()));

    assert!(service.dispatch(Command::UserCard("3493118".to_string())).await.is_success());
    assert_eq!(service.client().credentials.borrow().as_slice(), &[Some(credential)]);
}

#[tokio::test]
async fn test_login_status_without_credential() {
    let service = service(FakeClient::new());
    let record = data(service.dispatch(Command::LoginStatus).await);
    assert_eq!(record, json!({"is_login": false}));
    assert!(service.client().calls().is_empty());
}

#[tokio::test]
async fn test_login_status_with_credential() {
    let credential = Credential::new("sess", "jct", "buvid");
    let service = Service::new(FakeClient::new(), MemoryCredentialStore::with_credential(credential));

    let record = data(service.dispatch(Command::LoginStatus).await);
    assert_eq!(record["is_login"], true);
    assert_eq!(record["uname"], "散步的猫");
    assert_eq!(record["level"], 6);
    assert_eq!(record["vip_label"], "年度大会员");
}

#[tokio::test]
async fn test_invalid_id_through_dispatch() {
    let service = service(FakeClient::new());
    let response = service.dispatch(Command::Video("xyz".to_string())).await;
    assert!(error_message(response).contains("Invalid video id"));
    assert!(service.client().calls().is_empty());
}
