//! Manual job triggers. Both return `202 Accepted` as soon as the job is
//! spawned; results land in the audit log and the notification table.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use stockledger_core::store::InventoryStore;
use stockledger_engine::Job;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ReconcileBody {
  #[serde(default)]
  pub product_id: Option<Uuid>,
}

/// `POST /jobs/reconcile`, optionally with body `{"product_id":"<uuid>"}`.
/// Without a body (or without `product_id`) every product is reconciled.
pub async fn reconcile<S>(
  State(state): State<AppState<S>>,
  body: Option<Json<ReconcileBody>>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + 'static,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();

  if let Some(id) = body.product_id
    && !state.store.product_exists(id).await.map_err(ApiError::storage)?
  {
    return Err(ApiError::NotFound(format!("product {id} not found")));
  }

  let accepted = state.scheduler.trigger(Job::Reconcile { product_id: body.product_id });
  Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// `POST /jobs/low-stock`
pub async fn low_stock<S>(State(state): State<AppState<S>>) -> impl IntoResponse
where
  S: InventoryStore + 'static,
{
  let accepted = state.scheduler.trigger(Job::LowStockCheck);
  (StatusCode::ACCEPTED, Json(accepted))
}
