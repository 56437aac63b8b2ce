//! Notification attempts: the recorded outcome of delivering one alert.
//!
//! An attempt is created `Pending` and moves at most once to `Sent` or
//! `Failed`. A retry is a fresh attempt, never an update of an old one.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
  Pending,
  Sent,
  Failed,
}

impl NotificationStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "PENDING",
      Self::Sent => "SENT",
      Self::Failed => "FAILED",
    }
  }

  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }
}

impl FromStr for NotificationStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PENDING" => Ok(Self::Pending),
      "SENT" => Ok(Self::Sent),
      "FAILED" => Ok(Self::Failed),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

impl fmt::Display for NotificationStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Kind ────────────────────────────────────────────────────────────────────

/// What an alert is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  /// A single product fell to or below the threshold.
  LowStock,
  /// One consolidated message listing every low product.
  LowStockDigest,
}

impl NotificationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::LowStock => "low_stock",
      Self::LowStockDigest => "low_stock_digest",
    }
  }
}

impl FromStr for NotificationKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "low_stock" => Ok(Self::LowStock),
      "low_stock_digest" => Ok(Self::LowStockDigest),
      other => Err(Error::UnknownKind(other.to_owned())),
    }
  }
}

// ─── Attempt ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAttempt {
  pub attempt_id: Uuid,
  pub kind:       NotificationKind,
  pub recipient:  String,
  pub subject:    String,
  pub status:     NotificationStatus,
  /// Name of the provider whose result was recorded.
  pub provider:   Option<String>,
  pub message_id: Option<String>,
  pub error:      Option<String>,
  pub created_at: DateTime<Utc>,
  pub sent_at:    Option<DateTime<Utc>>,
}

impl NotificationAttempt {
  /// A fresh `Pending` attempt stamped with the current time.
  pub fn pending(
    kind: NotificationKind,
    recipient: impl Into<String>,
    subject: impl Into<String>,
  ) -> Self {
    Self {
      attempt_id: Uuid::new_v4(),
      kind,
      recipient:  recipient.into(),
      subject:    subject.into(),
      status:     NotificationStatus::Pending,
      provider:   None,
      message_id: None,
      error:      None,
      created_at: Utc::now(),
      sent_at:    None,
    }
  }

  /// Apply a terminal outcome in memory. The store performs the same
  /// transition durably in
  /// [`crate::store::InventoryStore::finish_notification`].
  pub fn finish(&mut self, outcome: &DeliveryOutcome) {
    match outcome {
      DeliveryOutcome::Sent { provider, message_id, at } => {
        self.status = NotificationStatus::Sent;
        self.provider = Some(provider.clone());
        self.message_id = message_id.clone();
        self.error = None;
        self.sent_at = Some(*at);
      }
      DeliveryOutcome::Failed { provider, error } => {
        self.status = NotificationStatus::Failed;
        self.provider = provider.clone();
        self.error = Some(error.clone());
      }
    }
  }
}

/// The terminal state an attempt is moved into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
  Sent {
    provider:   String,
    message_id: Option<String>,
    at:         DateTime<Utc>,
  },
  Failed {
    /// `None` when no provider was ever contacted.
    provider: Option<String>,
    error:    String,
  },
}

impl DeliveryOutcome {
  pub fn status(&self) -> NotificationStatus {
    match self {
      Self::Sent { .. } => NotificationStatus::Sent,
      Self::Failed { .. } => NotificationStatus::Failed,
    }
  }
}
