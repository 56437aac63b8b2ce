//! Error types for `stockledger-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown notification status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown notification kind: {0:?}")]
  UnknownKind(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
