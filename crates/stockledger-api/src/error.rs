//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error(
    "insufficient stock for product {product_id}: {current_stock} on hand, cannot apply {delta}"
  )]
  InsufficientStock {
    product_id:    Uuid,
    current_stock: i64,
    delta:         i32,
  },

  #[error("storage unavailable: {0}")]
  StorageUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(e))
  }
}

impl From<stockledger_engine::Error> for ApiError {
  fn from(e: stockledger_engine::Error) -> Self {
    use stockledger_engine::Error as E;
    match e {
      E::ProductNotFound(id) => ApiError::NotFound(format!("product {id} not found")),
      E::InsufficientStock { product_id, current_stock, delta } => {
        ApiError::InsufficientStock { product_id, current_stock, delta }
      }
      E::StorageUnavailable(inner) => ApiError::StorageUnavailable(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, Json(json!({ "error": m }))),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, Json(json!({ "error": m }))),
      ApiError::InsufficientStock { product_id, current_stock, delta } => (
        StatusCode::CONFLICT,
        Json(json!({
          "error":         message,
          "product_id":    product_id,
          "current_stock": current_stock,
          "delta":         delta,
        })),
      ),
      ApiError::StorageUnavailable(e) => {
        tracing::error!(error = %e, "storage error while handling request");
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": message })))
      }
    }
    .into_response()
  }
}
