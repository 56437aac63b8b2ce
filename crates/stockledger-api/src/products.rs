//! Handlers for `/products` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | Oldest first |
//! | `POST` | `/products` | Body: `{"name":"Oak Table","slug":"oak-table"}` |
//! | `GET`  | `/products/:id` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use stockledger_core::{
  product::{NewProduct, Product},
  store::InventoryStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /products`
pub async fn list<S>(State(state): State<AppState<S>>) -> Result<Json<Vec<Product>>, ApiError>
where
  S: InventoryStore,
{
  let products = state.store.list_products().await.map_err(ApiError::storage)?;
  Ok(Json(products))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /products`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InventoryStore,
{
  let name = body.name.trim();
  let slug = body.slug.trim();
  if name.is_empty() || slug.is_empty() {
    return Err(ApiError::BadRequest("name and slug must not be empty".into()));
  }

  let product = state
    .store
    .add_product(NewProduct::new(name, slug))
    .await
    .map_err(ApiError::storage)?
    .created()
    .ok_or_else(|| ApiError::Conflict(format!("slug {slug:?} is already taken")))?;
  tracing::info!(product_id = %product.product_id, slug = %product.slug, "product created");
  Ok((StatusCode::CREATED, Json(product)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /products/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError>
where
  S: InventoryStore,
{
  let product = state
    .store
    .get_product(id)
    .await
    .map_err(ApiError::storage)?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
  Ok(Json(product))
}
