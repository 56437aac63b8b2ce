//! Error type for `stockledger-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("product not found: {0}")]
  ProductNotFound(Uuid),

  /// Rejected adjustment. Carries the stock the request was checked against
  /// so the caller can resize the request instead of retrying blindly.
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

impl Error {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StorageUnavailable(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
