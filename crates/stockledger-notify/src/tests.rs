//! HTTP-level tests for the concrete providers against a local axum server.

use std::sync::{Arc, Mutex};

use axum::{
  Json, Router,
  http::{HeaderMap, StatusCode},
  routing::post,
};
use reqwest::Client;
use serde_json::{Value, json};
use stockledger_core::{notification::NotificationStatus, stock::LowStockSignal};
use stockledger_store_sqlite::SqliteStore;
use tokio::net::TcpListener;

use crate::{
  AlertMessage, Delivery, Dispatcher, EmailProvider, NotifyConfig,
  config::{ResendConfig, SendGridConfig},
  resend::ResendProvider,
  sendgrid::SendGridProvider,
};

type Captured = Arc<Mutex<Option<(Option<String>, Value)>>>;

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{addr}")
}

fn capture(headers: &HeaderMap, body: Value, into: &Captured) {
  let auth = headers
    .get("authorization")
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  *into.lock().unwrap() = Some((auth, body));
}

fn resend_cfg(base_url: String) -> ResendConfig {
  ResendConfig { api_key: Some("re_test".into()), base_url }
}

fn sendgrid_cfg(base_url: String) -> SendGridConfig {
  SendGridConfig { api_key: Some("SG.test".into()), base_url }
}

// ─── Resend ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resend_posts_json_and_reads_message_id() {
  let captured: Captured = Arc::default();
  let c = captured.clone();
  let base = serve(Router::new().route(
    "/emails",
    post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
      capture(&headers, body, &c);
      Json(json!({ "id": "re_123" }))
    }),
  ))
  .await;

  let provider = ResendProvider::new(&resend_cfg(base), "shop@example.com", Client::new());
  let delivery = provider.send("ops@example.com", "Low stock", "<p>hi</p>").await;
  assert_eq!(delivery, Delivery::Sent { message_id: Some("re_123".into()) });

  let (auth, body) = captured.lock().unwrap().clone().unwrap();
  assert_eq!(auth.as_deref(), Some("Bearer re_test"));
  assert_eq!(body["to"], json!(["ops@example.com"]));
  assert_eq!(body["from"], "shop@example.com");
  assert_eq!(body["subject"], "Low stock");
}

#[tokio::test]
async fn resend_error_status_is_a_failed_delivery() {
  let base = serve(Router::new().route(
    "/emails",
    post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, "invalid from address") }),
  ))
  .await;

  let provider = ResendProvider::new(&resend_cfg(base), "shop@example.com", Client::new());
  match provider.send("ops@example.com", "s", "h").await {
    Delivery::Failed { error } => {
      assert!(error.contains("422"), "error: {error}");
      assert!(error.contains("invalid from address"), "error: {error}");
    }
    other => panic!("expected failure, got {other:?}"),
  }
}

#[tokio::test]
async fn unreachable_provider_is_a_failed_delivery() {
  // Bind then drop to get a port nothing is listening on.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let provider =
    ResendProvider::new(&resend_cfg(format!("http://{addr}")), "shop@example.com", Client::new());
  let delivery = provider.send("ops@example.com", "s", "h").await;
  assert!(matches!(delivery, Delivery::Failed { ref error } if error.contains("request failed")));
}

#[tokio::test]
async fn resend_without_key_reports_unconfigured() {
  let provider =
    ResendProvider::new(&ResendConfig::default(), "shop@example.com", Client::new());
  assert!(!provider.is_configured());
  assert_eq!(
    provider.send("ops@example.com", "s", "h").await,
    Delivery::failed("resend is not configured")
  );
}

// ─── SendGrid ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sendgrid_posts_personalizations_and_reads_header() {
  let captured: Captured = Arc::default();
  let c = captured.clone();
  let base = serve(Router::new().route(
    "/v3/mail/send",
    post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
      capture(&headers, body, &c);
      (StatusCode::ACCEPTED, [("x-message-id", "sg-42")])
    }),
  ))
  .await;

  let provider = SendGridProvider::new(&sendgrid_cfg(base), "shop@example.com", Client::new());
  let delivery = provider.send("ops@example.com", "Low stock", "<p>hi</p>").await;
  assert_eq!(delivery, Delivery::Sent { message_id: Some("sg-42".into()) });

  let (auth, body) = captured.lock().unwrap().clone().unwrap();
  assert_eq!(auth.as_deref(), Some("Bearer SG.test"));
  assert_eq!(body["personalizations"][0]["to"][0]["email"], "ops@example.com");
  assert_eq!(body["from"]["email"], "shop@example.com");
  assert_eq!(body["content"][0]["type"], "text/html");
}

// ─── Dispatcher over real providers ──────────────────────────────────────────

#[tokio::test]
async fn dispatcher_fails_over_from_resend_to_sendgrid() {
  let resend_base = serve(Router::new().route(
    "/emails",
    post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
  ))
  .await;
  let sendgrid_base = serve(Router::new().route(
    "/v3/mail/send",
    post(|| async { (StatusCode::ACCEPTED, [("x-message-id", "sg-7")]) }),
  ))
  .await;

  let cfg = NotifyConfig {
    alert_recipient: Some("ops@example.com".into()),
    resend: resend_cfg(resend_base),
    sendgrid: sendgrid_cfg(sendgrid_base),
    timeout_secs: 5,
    ..Default::default()
  };
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let dispatcher = Dispatcher::from_config(store, &cfg).unwrap();
  assert_eq!(dispatcher.primary_name(), Some("resend"));
  assert_eq!(dispatcher.fallback_name(), Some("sendgrid"));

  let attempt = dispatcher
    .send(AlertMessage::low_stock(&LowStockSignal {
      product_id:    Default::default(),
      product_name:  "Linen Throw".into(),
      current_stock: 2,
    }))
    .await;

  assert_eq!(attempt.status, NotificationStatus::Sent);
  assert_eq!(attempt.provider.as_deref(), Some("sendgrid"));
  assert_eq!(attempt.message_id.as_deref(), Some("sg-7"));
  assert_eq!(attempt.recipient, "ops@example.com");
}

#[tokio::test]
async fn zero_timeout_is_clamped_and_still_delivers() {
  let resend_base = serve(Router::new().route(
    "/emails",
    post(|| async {
      tokio::time::sleep(std::time::Duration::from_millis(50)).await;
      Json(json!({ "id": "re_9" }))
    }),
  ))
  .await;

  let cfg = NotifyConfig {
    alert_recipient: Some("ops@example.com".into()),
    resend: resend_cfg(resend_base),
    timeout_secs: 0,
    ..Default::default()
  };
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let dispatcher = Dispatcher::from_config(store, &cfg).unwrap();

  let attempt = dispatcher
    .send(AlertMessage::low_stock(&LowStockSignal {
      product_id:    Default::default(),
      product_name:  "Linen Throw".into(),
      current_stock: 2,
    }))
    .await;

  assert_eq!(attempt.status, NotificationStatus::Sent);
  assert_eq!(attempt.provider.as_deref(), Some("resend"));
  assert_eq!(attempt.message_id.as_deref(), Some("re_9"));
}
