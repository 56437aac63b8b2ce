//! Inventory services for stockledger.
//!
//! - [`Adjuster`] is the only sanctioned way to change stock. It appends one
//!   event per accepted adjustment and never lets stock go negative.
//! - [`Reconciler`] re-folds the ledger, writes audit records and queues
//!   low-stock alerts.
//! - [`Scheduler`] runs reconciliation jobs on timers and on demand through
//!   the same entry point.

pub mod adjust;
pub mod error;
pub mod reconcile;
pub mod scheduler;

pub use adjust::{Adjuster, Adjustment};
pub use error::{Error, Result};
pub use reconcile::{LowStockReport, Reconciler, RunReport, RunScope};
pub use scheduler::{Job, JobAccepted, JobOutcome, ScheduleConfig, ScheduleHandle, Scheduler};
