//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::{sync::Arc, time::Duration};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use serde_json::{Value, json};
use stockledger_core::{product::NewProduct, store::InventoryStore};
use stockledger_notify::{AlertReceiver, alert_channel};
use stockledger_store_sqlite::SqliteStore;
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{AppState, api_router};

async fn make_state() -> (AppState<SqliteStore>, AlertReceiver) {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let (tx, rx) = alert_channel(16);
  (AppState::new(store, tx), rx)
}

async fn send(state: &AppState<SqliteStore>, method: &str, uri: &str, body: Option<Value>) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  api_router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn seed_product(state: &AppState<SqliteStore>, name: &str, slug: &str) -> Uuid {
  state
    .store
    .add_product(NewProduct::new(name, slug))
    .await
    .unwrap()
    .created()
    .unwrap()
    .product_id
}

// ── Products ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_fetch_product() {
  let (state, _rx) = make_state().await;

  let resp = send(&state, "POST", "/products", Some(json!({"name": "Oak Table", "slug": "oak-table"}))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created = json_body(resp).await;
  let id = created["product_id"].as_str().unwrap().to_string();

  let resp = send(&state, "GET", &format!("/products/{id}"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["slug"], "oak-table");

  let resp = send(&state, "GET", "/products", None).await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_slug_is_conflict() {
  let (state, _rx) = make_state().await;
  seed_product(&state, "Oak Table", "oak-table").await;

  let resp = send(&state, "POST", "/products", Some(json!({"name": "Other", "slug": "oak-table"}))).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_creates_of_one_slug_yield_one_created_rest_conflict() {
  let (state, _rx) = make_state().await;

  let mut handles = Vec::new();
  for i in 0..8 {
    let state = state.clone();
    handles.push(tokio::spawn(async move {
      send(&state, "POST", "/products", Some(json!({"name": format!("Copy {i}"), "slug": "same"})))
        .await
        .status()
    }));
  }

  let mut statuses = Vec::new();
  for handle in handles {
    statuses.push(handle.await.unwrap());
  }
  assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CREATED).count(), 1, "{statuses:?}");
  assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 7, "{statuses:?}");
}

#[tokio::test]
async fn blank_product_name_is_bad_request() {
  let (state, _rx) = make_state().await;
  let resp = send(&state, "POST", "/products", Some(json!({"name": "  ", "slug": "x"}))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(resp).await["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn unknown_product_is_404() {
  let (state, _rx) = make_state().await;
  let resp = send(&state, "GET", &format!("/products/{}", Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Inventory ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn adjust_then_read_stock_and_events() {
  let (state, _rx) = make_state().await;
  let id = seed_product(&state, "Cedar Bench", "cedar-bench").await;
  let adjust = format!("/inventory/{id}/adjust");

  let resp = send(&state, "POST", &adjust, Some(json!({"delta": 50, "reason": "restock"}))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = json_body(resp).await;
  assert_eq!(body["previous_stock"], 0);
  assert_eq!(body["new_stock"], 50);
  assert_eq!(body["low_stock_alert"], false);

  let resp = send(
    &state,
    "POST",
    &adjust,
    Some(json!({"delta": -45, "reason": "sale", "actor": "till-3"})),
  )
  .await;
  let body = json_body(resp).await;
  assert_eq!(body["new_stock"], 5);
  assert_eq!(body["low_stock_alert"], true);
  assert_eq!(body["event"]["actor"], "till-3");

  let resp = send(&state, "GET", &format!("/inventory/{id}"), None).await;
  let level = json_body(resp).await;
  assert_eq!(level["stock"], 5);
  assert_eq!(level["event_count"], 2);
  assert_eq!(level["low_stock"], true);

  let resp = send(&state, "GET", &format!("/inventory/{id}/events"), None).await;
  let events = json_body(resp).await;
  let deltas: Vec<i64> = events
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["delta"].as_i64().unwrap())
    .collect();
  assert_eq!(deltas, vec![50, -45]);
}

#[tokio::test]
async fn oversell_is_409_with_context() {
  let (state, _rx) = make_state().await;
  let id = seed_product(&state, "Pine Crate", "pine-crate").await;
  let adjust = format!("/inventory/{id}/adjust");
  send(&state, "POST", &adjust, Some(json!({"delta": 5, "reason": "restock"}))).await;

  let resp = send(&state, "POST", &adjust, Some(json!({"delta": -10, "reason": "sale"}))).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body = json_body(resp).await;
  assert_eq!(body["current_stock"], 5);
  assert_eq!(body["delta"], -10);
  assert!(body["error"].as_str().unwrap().contains("insufficient stock"));

  let events = state.store.list_events_by_product(id).await.unwrap();
  assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn adjust_rejects_zero_delta_and_unknown_product() {
  let (state, _rx) = make_state().await;
  let id = seed_product(&state, "Clay Pot", "clay-pot").await;

  let resp = send(
    &state,
    "POST",
    &format!("/inventory/{id}/adjust"),
    Some(json!({"delta": 0, "reason": "correction"})),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(
    &state,
    "POST",
    &format!("/inventory/{}/adjust", Uuid::new_v4()),
    Some(json!({"delta": 1, "reason": "restock"})),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&state, "GET", &format!("/inventory/{}/events", Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Jobs & audit ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_job_is_accepted_and_audited() {
  let (state, mut rx) = make_state().await;
  let id = seed_product(&state, "Wool Blanket", "wool-blanket").await;
  send(
    &state,
    "POST",
    &format!("/inventory/{id}/adjust"),
    Some(json!({"delta": 4, "reason": "restock"})),
  )
  .await;

  let resp = send(&state, "POST", "/jobs/reconcile", Some(json!({"product_id": id}))).await;
  assert_eq!(resp.status(), StatusCode::ACCEPTED);
  let accepted = json_body(resp).await;
  assert_eq!(accepted["job"]["job"], "reconcile");
  assert!(accepted["job_id"].is_string());

  // Stock of 4 is low, so the run queues an alert once it finishes.
  let alert = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
  assert!(alert.subject.contains("Wool Blanket"));

  let resp = send(&state, "GET", &format!("/reconciliations?product_id={id}&limit=5"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let records = json_body(resp).await;
  let records = records.as_array().unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0]["calculated_stock"], 4);
  assert_eq!(records[0]["low_stock"], true);
}

#[tokio::test]
async fn bodyless_reconcile_triggers_full_sweep() {
  let (state, _rx) = make_state().await;
  seed_product(&state, "Oak Table", "oak-table").await;
  seed_product(&state, "Silk Scarf", "silk-scarf").await;

  let resp = send(&state, "POST", "/jobs/reconcile", None).await;
  assert_eq!(resp.status(), StatusCode::ACCEPTED);
  let accepted = json_body(resp).await;
  assert_eq!(accepted["job"]["job"], "reconcile");
  assert!(accepted["job"]["product_id"].is_null());

  for _ in 0..200 {
    if state.store.count_reconciliations(None).await.unwrap() == 2 {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("full sweep did not record both products");
}

#[tokio::test]
async fn reconcile_job_for_unknown_product_is_404() {
  let (state, _rx) = make_state().await;
  let resp = send(&state, "POST", "/jobs/reconcile", Some(json!({"product_id": Uuid::new_v4()}))).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn low_stock_job_is_accepted() {
  let (state, mut rx) = make_state().await;
  seed_product(&state, "Paper Lantern", "paper-lantern").await;

  let resp = send(&state, "POST", "/jobs/low-stock", None).await;
  assert_eq!(resp.status(), StatusCode::ACCEPTED);
  assert_eq!(json_body(resp).await["job"]["job"], "low_stock_check");

  let digest = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
  assert!(digest.html.contains("Paper Lantern"));
}

#[tokio::test]
async fn notifications_listing_starts_empty() {
  let (state, _rx) = make_state().await;
  let resp = send(&state, "GET", "/notifications?limit=10", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!([]));
}
