//! Error type for `stockledger-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] stockledger_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("notification attempt not found: {0}")]
  NotificationNotFound(uuid::Uuid),

  /// The attempt has already moved out of `PENDING`.
  #[error("notification attempt {0} is already finished")]
  AlreadyFinished(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
