//! Manager, builder and built-in drivers working together.

#![allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]

use mailgate::{
    Driver, DriverConfig, ErrorKind, MailConfig, Manager, Registry, SendContext,
    register_builtin_drivers,
};
use mailgate_core::testing::MockDriver;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn registry() -> Arc<Registry> {
    let registry = Registry::new();
    register_builtin_drivers(&registry);
    Arc::new(registry)
}

#[tokio::test]
async fn test_config_from_json_sends_through_mandrill() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages/send.json"))
        .and(body_partial_json(json!({
            "key": "md-key",
            "message": {
                "from_email": "noreply@example.com",
                "from_name": "Example",
                "subject": "Welcome",
                "text": "Hello",
                "images": [{"name": "logo", "type": "image/png"}],
            }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"_id": "m-1", "email": "a@example.com", "status": "queued"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config: MailConfig = serde_json::from_value(json!({
        "default_from": "noreply@example.com",
        "default_from_name": "Example",
        "drivers": {
            "mandrill": {"api_key": "md-key", "base_url": server.uri(), "timeout": "5s"},
            "smtp": {"host": "127.0.0.1", "port": 2525},
        }
    }))
    .unwrap();

    // No "default" key: the manager falls back to mandrill.
    let manager = Manager::new(config, registry()).unwrap();
    assert_eq!(manager.config().default_driver, "mandrill");

    let result = manager
        .builder()
        .to(["a@example.com"])
        .subject("Welcome")
        .text("Hello")
        .embed_with_type("logo", "logo.png", vec![0x89, 0x50], "image/png")
        .send(&SendContext::new())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.message_id, "m-1");
    assert_eq!(result.status, "queued");
    assert_eq!(manager.cached_drivers(), 1);
}

#[tokio::test]
async fn test_builder_error_skips_driver_resolution() {
    let built = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new();
    let counter = Arc::clone(&built);
    registry.register("mock", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockDriver::new("mock")) as Arc<dyn Driver>)
    });
    let manager = Manager::new(
        MailConfig::new("mock").driver("mock", DriverConfig::new()),
        Arc::new(registry),
    )
    .unwrap();

    let err = manager
        .builder()
        .to([""])
        .subject("ignored")
        .text("ignored")
        .send(&SendContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRecipient);
    assert_eq!(built.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_driver_override_and_unknown_driver() {
    let mock = Arc::new(MockDriver::new("mock"));
    let registry = registry();
    let shared = Arc::clone(&mock);
    registry.register("mock", move |_| Ok(Arc::clone(&shared) as Arc<dyn Driver>));

    let config = MailConfig::new("smtp")
        .default_from("app@example.com", "")
        .driver("smtp", DriverConfig::new().set("host", "127.0.0.1"))
        .driver("mock", DriverConfig::new());
    let manager = Manager::new(config, registry).unwrap();

    manager
        .builder()
        .driver("mock")
        .to(["user@example.com"])
        .subject("Hi")
        .html("<p>Hi</p>")
        .send(&SendContext::new())
        .await
        .unwrap();

    let sent = mock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, "app@example.com");

    let err = manager
        .builder()
        .driver("sendgrid")
        .to(["user@example.com"])
        .subject("Hi")
        .text("Hi")
        .send(&SendContext::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DriverNotFound);
}

#[test]
fn test_concurrent_first_use_builds_once() {
    let built = Arc::new(AtomicUsize::new(0));
    let registry = Registry::new();
    let counter = Arc::clone(&built);
    registry.register("mock", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(10));
        Ok(Arc::new(MockDriver::new("mock")) as Arc<dyn Driver>)
    });
    let manager = Arc::new(
        Manager::new(
            MailConfig::new("mock").driver("mock", DriverConfig::new()),
            Arc::new(registry),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || manager.default_driver().unwrap())
        })
        .collect();
    let drivers: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(drivers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));

    manager.shutdown();
    assert_eq!(manager.cached_drivers(), 0);
    manager.default_driver().unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[test]
fn test_misconfigured_smtp_is_not_cached() {
    let config = MailConfig::new("smtp").driver("smtp", DriverConfig::new().set("security", "ssl"));
    let manager = Manager::new(config, registry()).unwrap();

    let err = manager.default_driver().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DriverConfig);
    assert_eq!(manager.cached_drivers(), 0);
}

#[tokio::test]
async fn test_provider_rejection_surfaces_result() {
    let mock = Arc::new(MockDriver::rejecting("mock", "hard-bounce"));
    let registry = Registry::new();
    let shared = Arc::clone(&mock);
    registry.register("mock", move |_| Ok(Arc::clone(&shared) as Arc<dyn Driver>));
    let manager = Manager::new(
        MailConfig::new("mock")
            .default_from("app@example.com", "App")
            .driver("mock", DriverConfig::new()),
        Arc::new(registry),
    )
    .unwrap();

    let err = manager
        .builder()
        .to(["user@example.com"])
        .subject("Hi")
        .text("Hi")
        .send(&SendContext::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SendFailed);
    assert!(!err.is_retryable());
    let result = err.result().unwrap();
    assert!(!result.success);
    assert_eq!(result.status, "rejected");
    assert_eq!(mock.sent().len(), 1);
    assert_eq!(mock.sent()[0].from_name, "App");
}
