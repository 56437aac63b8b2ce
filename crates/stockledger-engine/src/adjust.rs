//! [`Adjuster`]: the only sanctioned way to change stock.

use std::sync::Arc;

use serde::Serialize;
use stockledger_core::{
  event::{GuardedAppend, InventoryEvent, NewEvent, Reason},
  stock::{self, LOW_STOCK_THRESHOLD, StockLevel},
  store::InventoryStore,
};
use uuid::Uuid;

use crate::{Error, Result};

/// Result of an accepted adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct Adjustment {
  pub event:           InventoryEvent,
  pub previous_stock:  i64,
  pub new_stock:       i64,
  /// Advisory: the new stock is at or below the low-stock threshold. The
  /// caller decides whether to alert now or leave it to the next sweep.
  pub low_stock_alert: bool,
}

/// Validates adjustments and appends them to the ledger.
pub struct Adjuster<S> {
  store: Arc<S>,
}

impl<S: InventoryStore> Adjuster<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Apply a signed stock change to `product_id`.
  ///
  /// Fails with [`Error::ProductNotFound`] for an unknown product and with
  /// [`Error::InsufficientStock`] if the change would take stock below zero,
  /// in which case nothing is appended. The non-negativity check and the
  /// append happen atomically in the store, so concurrent adjustments of the
  /// same product cannot both pass against a stale balance.
  pub async fn adjust(
    &self,
    product_id: Uuid,
    delta: i32,
    reason: impl Into<Reason>,
    actor: Option<String>,
  ) -> Result<Adjustment> {
    let reason = reason.into();

    if !self.store.product_exists(product_id).await.map_err(Error::storage)? {
      return Err(Error::ProductNotFound(product_id));
    }

    let input = NewEvent { product_id, delta, reason, actor };
    match self
      .store
      .append_event_guarded(input, 0)
      .await
      .map_err(Error::storage)?
    {
      GuardedAppend::Appended { event, previous_stock } => {
        let new_stock = previous_stock + i64::from(delta);
        let low_stock_alert = stock::is_low_stock(new_stock, LOW_STOCK_THRESHOLD);
        tracing::info!(
          %product_id,
          delta,
          reason = %event.reason,
          previous_stock,
          new_stock,
          low_stock_alert,
          "stock adjusted"
        );
        Ok(Adjustment { event, previous_stock, new_stock, low_stock_alert })
      }
      GuardedAppend::Rejected { current_stock } => {
        tracing::warn!(%product_id, delta, current_stock, "adjustment rejected: insufficient stock");
        Err(Error::InsufficientStock { product_id, current_stock, delta })
      }
    }
  }

  /// Re-fold the product's ledger into a current reading.
  pub async fn stock_level(&self, product_id: Uuid) -> Result<StockLevel> {
    if !self.store.product_exists(product_id).await.map_err(Error::storage)? {
      return Err(Error::ProductNotFound(product_id));
    }
    let events = self
      .store
      .list_events_by_product(product_id)
      .await
      .map_err(Error::storage)?;
    Ok(StockLevel::from_events(product_id, &events))
  }
}
