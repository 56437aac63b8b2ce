//! Read-only views over the reconciliation log and notification attempts.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reconciliations` | Optional `?product_id=<uuid>&limit=<n>`, newest first |
//! | `GET`  | `/notifications` | Optional `?limit=<n>`, newest first |

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use stockledger_core::{
  audit::ReconciliationRecord,
  notification::NotificationAttempt,
  store::InventoryStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ReconciliationParams {
  pub product_id: Option<Uuid>,
  pub limit:      Option<usize>,
}

/// `GET /reconciliations[?product_id=<uuid>][&limit=<n>]`
pub async fn reconciliations<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ReconciliationParams>,
) -> Result<Json<Vec<ReconciliationRecord>>, ApiError>
where
  S: InventoryStore,
{
  let records = state
    .store
    .list_reconciliations(params.product_id, params.limit)
    .await
    .map_err(ApiError::storage)?;
  Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
  pub limit: Option<usize>,
}

/// `GET /notifications[?limit=<n>]`
pub async fn notifications<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<NotificationParams>,
) -> Result<Json<Vec<NotificationAttempt>>, ApiError>
where
  S: InventoryStore,
{
  let attempts = state
    .store
    .list_notifications(params.limit)
    .await
    .map_err(ApiError::storage)?;
  Ok(Json(attempts))
}
