//! Mandrill driver against a mock HTTP server.

#![allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]

use mailgate_core::{CancellationToken, Driver, ErrorKind, Message, SendContext, SendResult};
use mailgate_mandrill::{MandrillConfig, MandrillDriver};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn driver(server: &MockServer) -> MandrillDriver {
    MandrillDriver::new(MandrillConfig::new("test-key").with_base_url(format!("{}/api/1.0", server.uri())))
        .unwrap()
}

fn message() -> Message {
    let mut message = Message::new()
        .to("alice@example.com")
        .cc("carol@example.com")
        .bcc("bob@example.com");
    message.from = "noreply@example.com".into();
    message.from_name = "Example".into();
    message.subject = "Welcome".into();
    message.body_html = "<h1>Hello</h1>".into();
    message.reply_to = "support@example.com".into();
    message
}

#[tokio::test]
async fn test_send_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/1.0/messages/send.json"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "key": "test-key",
            "message": {
                "from_email": "noreply@example.com",
                "from_name": "Example",
                "subject": "Welcome",
                "headers": {"Reply-To": "support@example.com"},
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "abc123", "email": "alice@example.com", "status": "sent", "reject_reason": null},
            {"_id": "def456", "email": "carol@example.com", "status": "rejected"},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let result = driver(&server)
        .send(&SendContext::new(), &message())
        .await
        .unwrap();
    assert_eq!(result, SendResult::new("abc123", "sent", true));

    let requests = server.received_requests().await.unwrap();
    let body: Value = requests[0].body_json().unwrap();
    let kinds: Vec<&str> = body["message"]["to"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["to", "cc", "bcc"]);
}

#[tokio::test]
async fn test_rejection_returns_result_with_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "x", "email": "alice@example.com", "status": "rejected", "reject_reason": "hard-bounce"}
        ])))
        .mount(&server)
        .await;

    let err = driver(&server)
        .send(&SendContext::new(), &message())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SendFailed);
    assert!(err.to_string().contains("hard-bounce"));
    assert_eq!(err.result(), Some(&SendResult::new("x", "rejected", false)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_api_error_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "status": "error",
            "code": -1,
            "name": "Invalid_Key",
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let err = driver(&server)
        .send(&SendContext::new(), &message())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SendFailed);
    assert!(err.to_string().contains("Invalid_Key - Invalid API key"));
    assert!(err.result().is_none());
}

#[tokio::test]
async fn test_empty_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = driver(&server)
        .send(&SendContext::new(), &message())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SendFailed);
    assert!(err.result().is_none());
}

#[tokio::test]
async fn test_unparseable_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = driver(&server)
        .send(&SendContext::new(), &message())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SendFailed);
}

#[tokio::test]
async fn test_invalid_message_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let mut message = message();
    message.to.clear();
    let err = driver(&server)
        .send(&SendContext::new(), &message)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRecipient);
}

#[tokio::test]
async fn test_context_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"_id": "late", "status": "sent"}]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let ctx = SendContext::with_timeout(Duration::from_millis(100));
    let err = driver(&server).send(&ctx, &message()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_cancellation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let ctx = SendContext::new().cancellation(token.clone());
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = driver(&server).send(&ctx, &message()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    canceller.await.unwrap();
}

#[tokio::test]
async fn test_client_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let mut config = MandrillConfig::new("k").with_base_url(server.uri());
    config.timeout = Duration::from_millis(100);
    let err = MandrillDriver::new(config)
        .unwrap()
        .send(&SendContext::new(), &message())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = MandrillDriver::new(MandrillConfig::new("k").with_base_url(format!("http://127.0.0.1:{port}")))
        .unwrap()
        .send(&SendContext::new(), &message())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    assert!(err.is_retryable());
}
