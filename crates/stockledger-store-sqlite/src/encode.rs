//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so lexical order matches chronological order.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use stockledger_core::{
  audit::ReconciliationRecord,
  event::{InventoryEvent, Reason},
  notification::{NotificationAttempt, NotificationKind, NotificationStatus},
  product::Product,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Convert an optional row limit into SQLite's "`-1` means unlimited" form.
pub fn encode_limit(limit: Option<usize>) -> i64 {
  limit.and_then(|l| i64::try_from(l).ok()).unwrap_or(-1)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `inventory_events` row.
pub struct RawEvent {
  pub sequence:    i64,
  pub event_id:    String,
  pub product_id:  String,
  pub delta:       i32,
  pub reason:      String,
  pub actor:       Option<String>,
  pub recorded_at: String,
}

impl RawEvent {
  pub const COLUMNS: &'static str =
    "sequence, event_id, product_id, delta, reason, actor, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      sequence:    row.get(0)?,
      event_id:    row.get(1)?,
      product_id:  row.get(2)?,
      delta:       row.get(3)?,
      reason:      row.get(4)?,
      actor:       row.get(5)?,
      recorded_at: row.get(6)?,
    })
  }

  pub fn into_event(self) -> Result<InventoryEvent> {
    Ok(InventoryEvent {
      event_id:    decode_uuid(&self.event_id)?,
      sequence:    self.sequence,
      product_id:  decode_uuid(&self.product_id)?,
      delta:       self.delta,
      reason:      Reason::from(self.reason),
      actor:       self.actor,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `products` row.
pub struct RawProduct {
  pub product_id: String,
  pub name:       String,
  pub slug:       String,
  pub created_at: String,
}

impl RawProduct {
  pub const COLUMNS: &'static str = "product_id, name, slug, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id: row.get(0)?,
      name:       row.get(1)?,
      slug:       row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id: decode_uuid(&self.product_id)?,
      name:       self.name,
      slug:       self.slug,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `reconciliations` row.
pub struct RawReconciliation {
  pub record_id:        String,
  pub run_id:           String,
  pub product_id:       String,
  pub calculated_stock: i64,
  pub event_count:      i64,
  pub low_stock:        bool,
  pub description:      String,
  pub recorded_at:      String,
}

impl RawReconciliation {
  pub const COLUMNS: &'static str = "record_id, run_id, product_id, calculated_stock, \
                                     event_count, low_stock, description, recorded_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:        row.get(0)?,
      run_id:           row.get(1)?,
      product_id:       row.get(2)?,
      calculated_stock: row.get(3)?,
      event_count:      row.get(4)?,
      low_stock:        row.get(5)?,
      description:      row.get(6)?,
      recorded_at:      row.get(7)?,
    })
  }

  pub fn into_record(self) -> Result<ReconciliationRecord> {
    Ok(ReconciliationRecord {
      record_id:        decode_uuid(&self.record_id)?,
      run_id:           decode_uuid(&self.run_id)?,
      product_id:       decode_uuid(&self.product_id)?,
      calculated_stock: self.calculated_stock,
      event_count:      self.event_count,
      low_stock:        self.low_stock,
      description:      self.description,
      recorded_at:      decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `notification_attempts` row.
pub struct RawNotification {
  pub attempt_id: String,
  pub kind:       String,
  pub recipient:  String,
  pub subject:    String,
  pub status:     String,
  pub provider:   Option<String>,
  pub message_id: Option<String>,
  pub error:      Option<String>,
  pub created_at: String,
  pub sent_at:    Option<String>,
}

impl RawNotification {
  pub const COLUMNS: &'static str = "attempt_id, kind, recipient, subject, status, \
                                     provider, message_id, error, created_at, sent_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attempt_id: row.get(0)?,
      kind:       row.get(1)?,
      recipient:  row.get(2)?,
      subject:    row.get(3)?,
      status:     row.get(4)?,
      provider:   row.get(5)?,
      message_id: row.get(6)?,
      error:      row.get(7)?,
      created_at: row.get(8)?,
      sent_at:    row.get(9)?,
    })
  }

  pub fn into_attempt(self) -> Result<NotificationAttempt> {
    Ok(NotificationAttempt {
      attempt_id: decode_uuid(&self.attempt_id)?,
      kind:       self.kind.parse::<NotificationKind>()?,
      recipient:  self.recipient,
      subject:    self.subject,
      status:     self.status.parse::<NotificationStatus>()?,
      provider:   self.provider,
      message_id: self.message_id,
      error:      self.error,
      created_at: decode_dt(&self.created_at)?,
      sent_at:    self.sent_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}
