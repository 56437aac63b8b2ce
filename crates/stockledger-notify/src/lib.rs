//! Low-stock alert delivery for stockledger.
//!
//! An [`AlertMessage`] is pushed onto a bounded in-process queue by the
//! reconciliation worker and drained by a consumer task that hands each
//! message to the [`Dispatcher`]. The dispatcher delivers through a primary
//! email provider, falls back once to a secondary provider on failure, and
//! records every attempt in the store.
//!
//! Delivery failures never surface as errors: they become `FAILED`
//! [`NotificationAttempt`](stockledger_core::notification::NotificationAttempt)s.

pub mod alert;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod provider;
pub mod queue;
pub mod resend;
pub mod sendgrid;

pub use alert::AlertMessage;
pub use config::{NotifyConfig, ProviderKind, Selection, select_providers};
pub use dispatcher::Dispatcher;
pub use error::{EnqueueError, Error, Result};
pub use provider::{Delivery, EmailProvider, Provider};
pub use queue::{AlertReceiver, AlertSender, alert_channel, spawn_consumer};

#[cfg(test)]
mod tests;
