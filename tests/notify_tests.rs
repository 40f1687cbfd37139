//! Consumer side: rendering, delivery, and the adapter/WebDriver HTTP clients.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use github_notify::config::{AdapterConfig, NotifyTargets};
use github_notify::notify::{
    AdapterClient, CaptureTarget, ChatSender, Notifier, PageCapture, Renderer, WebDriverCapture,
};
use github_notify::webhooks::{event_channel, EventType, Normalizer};

mod common;
use common::*;

fn star_event() -> github_notify::webhooks::Event {
    let payload: serde_json::Value = serde_json::from_str(&star_body("alice")).unwrap();
    Normalizer::default().normalize(EventType::Star, payload).unwrap()
}

#[tokio::test]
async fn test_delivers_to_both_targets() {
    let sender = Arc::new(RecordingSender::default());
    let notifier = Notifier::new(
        Renderer::default(),
        sender.clone(),
        NotifyTargets { user_id: 10, group_id: 20 },
    );

    notifier.handle(&star_event()).await;

    let expected = "alice starred bob/proj (total 7 stargazers)".to_string();
    assert_eq!(sender.private_messages(), vec![(10, expected.clone())]);
    assert_eq!(sender.group_messages(), vec![(20, expected)]);
}

#[tokio::test]
async fn test_unset_targets_are_skipped() {
    let sender = Arc::new(RecordingSender::default());
    let notifier = Notifier::new(
        Renderer::default(),
        sender.clone(),
        NotifyTargets { user_id: 0, group_id: 20 },
    );
    notifier.handle(&star_event()).await;
    assert!(sender.private_messages().is_empty());
    assert_eq!(sender.group_messages().len(), 1);
}

#[tokio::test]
async fn test_failed_target_does_not_block_the_other() {
    let sender = Arc::new(RecordingSender::failing_private());
    let notifier = Notifier::new(
        Renderer::default(),
        sender.clone(),
        NotifyTargets { user_id: 10, group_id: 20 },
    );
    notifier.handle(&star_event()).await;
    assert_eq!(sender.group_messages().len(), 1);
}

#[tokio::test]
async fn test_unrendered_events_send_nothing() {
    let sender = Arc::new(RecordingSender::default());
    let notifier = Notifier::new(
        Renderer::default(),
        sender.clone(),
        NotifyTargets { user_id: 10, group_id: 20 },
    );
    let event = Normalizer::default()
        .normalize(EventType::PullRequest, json!({ "action": "closed" }))
        .unwrap();
    notifier.handle(&event).await;
    assert!(sender.private_messages().is_empty());
    assert!(sender.group_messages().is_empty());
}

#[tokio::test]
async fn test_webhook_to_chat_end_to_end() {
    let sender = Arc::new(RecordingSender::default());
    let (tx, rx) = event_channel(10, Duration::from_secs(2));
    let config = github_notify::config::WebhookConfig {
        secret: SECRET.to_string(),
        ..Default::default()
    };
    let app = github_notify::webhooks::router(github_notify::webhooks::WebhookState::new(&config, tx));

    let notifier = Notifier::new(
        Renderer::default(),
        sender.clone(),
        NotifyTargets { user_id: 0, group_id: 99 },
    );
    let consumer = tokio::spawn(notifier.run(rx));

    let response = app.oneshot(signed_request("star", &star_body("carol"))).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    // Dropping the router drops the last sender, which ends the consumer loop.
    consumer.await.unwrap();
    assert_eq!(
        sender.group_messages(),
        vec![(99, "carol starred bob/proj (total 7 stargazers)".to_string())]
    );
}

#[tokio::test]
async fn test_adapter_client_posts_messages() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_private_msg"))
        .and(header("authorization", "Bearer app-secret"))
        .and(header("x-app-id", "app-1"))
        .and(body_json(json!({ "user_id": 10, "message": "hello" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/send_group_msg"))
        .and(body_json(json!({ "group_id": 20, "message": "hello" })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AdapterClient::new(&AdapterConfig {
        addr: mock_server.uri(),
        app_id: "app-1".to_string(),
        app_secret: "app-secret".to_string(),
        encrypt_key: String::new(),
    });

    assert!(client.send_private_msg(10, "hello").await.is_ok());
    assert!(client.send_group_msg(20, "hello").await.is_err());
}

#[tokio::test]
async fn test_webdriver_capture_flow() {
    let mock_server = MockServer::start().await;
    let element_key = "element-6066-11e4-a52e-4f735466cecf";

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": "s1", "capabilities": {} }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .and(body_json(json!({ "url": "https://github.com/bob/proj/issues/1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .and(body_json(json!({ "using": "css selector", "value": "#js-repo-pjax-container" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": { element_key: "container" } })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .and(body_json(json!({ "using": "css selector", "value": "#issue-99 > div" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": { element_key: "issue" } })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s1/element/container/rect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "x": 0, "y": 0, "width": 374.2, "height": 900.4 }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/window/rect"))
        .and(body_json(json!({ "width": 375, "height": 1001 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": {} })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s1/element/issue/screenshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "cG5n" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/session/s1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let capture = WebDriverCapture::new(&mock_server.uri()).unwrap();
    let png = capture
        .capture(&CaptureTarget::Issue {
            url: "https://github.com/bob/proj/issues/1".to_string(),
            issue_id: "99".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(png, b"png");
}

#[tokio::test]
async fn test_webdriver_session_closed_on_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": { "sessionId": "s2" } })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s2/url"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "unknown error", "message": "net::ERR_NAME_NOT_RESOLVED" }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let capture = WebDriverCapture::new(&mock_server.uri()).unwrap();
    let err = capture
        .capture(&CaptureTarget::PullRequest { url: "https://github.invalid/pull/1".to_string() })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
}
