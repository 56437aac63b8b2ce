//! Handlers for `/inventory` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/inventory/:product_id` | Current stock, re-folded from the ledger |
//! | `GET`  | `/inventory/:product_id/events` | Ledger in replay order |
//! | `POST` | `/inventory/:product_id/adjust` | Body: `{"delta":-3,"reason":"sale"}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use stockledger_core::{
  event::{InventoryEvent, Reason},
  stock::StockLevel,
  store::InventoryStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Stock ────────────────────────────────────────────────────────────────────

/// `GET /inventory/:product_id`
pub async fn stock<S>(
  State(state): State<AppState<S>>,
  Path(product_id): Path<Uuid>,
) -> Result<Json<StockLevel>, ApiError>
where
  S: InventoryStore + 'static,
{
  Ok(Json(state.adjuster.stock_level(product_id).await?))
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// `GET /inventory/:product_id/events`
pub async fn events<S>(
  State(state): State<AppState<S>>,
  Path(product_id): Path<Uuid>,
) -> Result<Json<Vec<InventoryEvent>>, ApiError>
where
  S: InventoryStore,
{
  if !state.store.product_exists(product_id).await.map_err(ApiError::storage)? {
    return Err(ApiError::NotFound(format!("product {product_id} not found")));
  }
  let events = state
    .store
    .list_events_by_product(product_id)
    .await
    .map_err(ApiError::storage)?;
  Ok(Json(events))
}

// ─── Adjust ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdjustBody {
  pub delta:  i32,
  pub reason: Reason,
  #[serde(default)]
  pub actor:  Option<String>,
}

/// `POST /inventory/:product_id/adjust`
pub async fn adjust<S>(
  State(state): State<AppState<S>>,
  Path(product_id): Path<Uuid>,
  Json(body): Json<AdjustBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore + 'static,
{
  if body.delta == 0 {
    return Err(ApiError::BadRequest("delta must not be zero".into()));
  }
  if body.reason.as_str().trim().is_empty() {
    return Err(ApiError::BadRequest("reason must not be empty".into()));
  }

  let adjustment = state
    .adjuster
    .adjust(product_id, body.delta, body.reason, body.actor)
    .await?;
  Ok((StatusCode::CREATED, Json(adjustment)))
}
