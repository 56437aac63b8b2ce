//! Inventory events: the fundamental unit of the ledger.
//!
//! An event is an immutable signed change to a product's stock. Events are
//! never updated or deleted; the current stock of a product is the fold of
//! its events (see [`crate::stock`]).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Reason ──────────────────────────────────────────────────────────────────

/// Why stock changed. Well-known reasons have their own variant; anything
/// else is kept verbatim in [`Reason::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Reason {
  Restock,
  Sale,
  Correction,
  Damage,
  Return,
  Other(String),
}

impl Reason {
  /// The string stored in the `reason` column.
  pub fn as_str(&self) -> &str {
    match self {
      Self::Restock => "restock",
      Self::Sale => "sale",
      Self::Correction => "correction",
      Self::Damage => "damage",
      Self::Return => "return",
      Self::Other(s) => s,
    }
  }
}

impl From<String> for Reason {
  fn from(s: String) -> Self {
    match s.as_str() {
      "restock" => Self::Restock,
      "sale" => Self::Sale,
      "correction" => Self::Correction,
      "damage" => Self::Damage,
      "return" => Self::Return,
      _ => Self::Other(s),
    }
  }
}

impl From<&str> for Reason {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<Reason> for String {
  fn from(r: Reason) -> Self {
    match r {
      Reason::Other(s) => s,
      known => known.as_str().to_owned(),
    }
  }
}

impl fmt::Display for Reason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── InventoryEvent ──────────────────────────────────────────────────────────

/// An immutable stock change. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEvent {
  pub event_id:    Uuid,
  /// Store-assigned insertion order; breaks ties between equal timestamps.
  pub sequence:    i64,
  pub product_id:  Uuid,
  /// Positive adds stock, negative consumes it.
  pub delta:       i32,
  pub reason:      Reason,
  /// Who or what caused the change (a user, a checkout job, ...).
  pub actor:       Option<String>,
  /// Server-assigned timestamp; defines the fold order.
  pub recorded_at: DateTime<Utc>,
}

// ─── NewEvent ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::InventoryStore::append_event`].
/// `event_id`, `sequence` and `recorded_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub product_id: Uuid,
  pub delta:      i32,
  pub reason:     Reason,
  pub actor:      Option<String>,
}

impl NewEvent {
  pub fn new(product_id: Uuid, delta: i32, reason: impl Into<Reason>) -> Self {
    Self { product_id, delta, reason: reason.into(), actor: None }
  }

  pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
    self.actor = Some(actor.into());
    self
  }
}

// ─── Guarded append ──────────────────────────────────────────────────────────

/// Result of [`crate::store::InventoryStore::append_event_guarded`].
#[derive(Debug, Clone)]
pub enum GuardedAppend {
  /// The event was appended; `previous_stock` is the stock it was checked
  /// against.
  Appended {
    event:          InventoryEvent,
    previous_stock: i64,
  },
  /// Appending would have taken stock below the floor; nothing was written.
  Rejected { current_stock: i64 },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_reasons_parse_to_variants() {
    assert_eq!(Reason::from("restock"), Reason::Restock);
    assert_eq!(Reason::from("sale"), Reason::Sale);
    assert_eq!(Reason::from("return"), Reason::Return);
  }

  #[test]
  fn free_text_reason_is_preserved() {
    let r = Reason::from("shrinkage audit");
    assert_eq!(r, Reason::Other("shrinkage audit".into()));
    assert_eq!(r.as_str(), "shrinkage audit");
  }

  #[test]
  fn reason_serialises_as_plain_string() {
    let json = serde_json::to_string(&Reason::Damage).unwrap();
    assert_eq!(json, "\"damage\"");
    let back: Reason = serde_json::from_str("\"correction\"").unwrap();
    assert_eq!(back, Reason::Correction);
  }
}
