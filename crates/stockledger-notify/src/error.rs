//! Error types for `stockledger-notify`.
//!
//! Only construction can fail with [`Error`]. Delivery problems are reported
//! through [`crate::Delivery::Failed`] and recorded, never returned.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  HttpClient(#[from] reqwest::Error),
}

/// Why an alert could not be placed on the queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
  #[error("alert queue is full")]
  Full,
  #[error("alert queue consumer has shut down")]
  Closed,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
