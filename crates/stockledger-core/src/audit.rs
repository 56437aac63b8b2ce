//! Reconciliation audit records.
//!
//! One record is written per product per reconciliation run. Records are
//! write-once; a later run produces new records rather than updating old ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationRecord {
  pub record_id:        Uuid,
  /// Shared by every record written during the same sweep.
  pub run_id:           Uuid,
  pub product_id:       Uuid,
  pub calculated_stock: i64,
  pub event_count:      i64,
  pub low_stock:        bool,
  pub description:      String,
  pub recorded_at:      DateTime<Utc>,
}

/// Input to [`crate::store::InventoryStore::record_reconciliation`].
#[derive(Debug, Clone)]
pub struct NewReconciliation {
  pub run_id:           Uuid,
  pub product_id:       Uuid,
  pub calculated_stock: i64,
  pub event_count:      i64,
  pub low_stock:        bool,
  pub description:      String,
}
