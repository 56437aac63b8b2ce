//! The stock calculator: a pure fold over the event log.
//!
//! Nothing here performs I/O. Given the same event sequence these functions
//! always return the same value, which is what makes reconciliation
//! idempotent.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::InventoryEvent;

/// Stock at or below this many units is flagged for restocking attention.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Sum signed deltas. Accumulates in `i64` so 32-bit deltas cannot wrap.
pub fn fold_deltas<I>(deltas: I) -> i64
where
  I: IntoIterator<Item = i32>,
{
  deltas.into_iter().map(i64::from).sum()
}

/// Current stock for an ordered sequence of events.
pub fn current_stock<'a, I>(events: I) -> i64
where
  I: IntoIterator<Item = &'a InventoryEvent>,
{
  fold_deltas(events.into_iter().map(|e| e.delta))
}

pub fn is_low_stock(stock: i64, threshold: i64) -> bool { stock <= threshold }

/// A computed stock reading for one product. Never stored, always derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
  pub product_id:  Uuid,
  pub stock:       i64,
  pub event_count: usize,
  pub low_stock:   bool,
}

impl StockLevel {
  /// Fold `events` (all belonging to `product_id`) into a reading.
  pub fn from_events(product_id: Uuid, events: &[InventoryEvent]) -> Self {
    let stock = current_stock(events);
    Self {
      product_id,
      stock,
      event_count: events.len(),
      low_stock: is_low_stock(stock, LOW_STOCK_THRESHOLD),
    }
  }
}

/// Transient tuple handed to the notification layer when a product is low.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockSignal {
  pub product_id:    Uuid,
  pub product_name:  String,
  pub current_stock: i64,
}
