//! JSON REST API for stockledger.
//!
//! Exposes an axum [`Router`] backed by any
//! [`stockledger_core::store::InventoryStore`]. Auth, TLS, and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", stockledger_api::api_router(state.clone()))
//! ```

pub mod audit;
pub mod error;
pub mod inventory;
pub mod jobs;
pub mod products;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use stockledger_core::store::InventoryStore;
use stockledger_engine::{Adjuster, Reconciler, Scheduler};
use stockledger_notify::AlertSender;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:     Arc<S>,
  pub adjuster:  Arc<Adjuster<S>>,
  pub scheduler: Scheduler<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:     self.store.clone(),
      adjuster:  self.adjuster.clone(),
      scheduler: self.scheduler.clone(),
    }
  }
}

impl<S: InventoryStore + 'static> AppState<S> {
  /// Wire the adjustment service and scheduler over `store`. Low-stock
  /// alerts raised by reconciliation go to `alerts`.
  pub fn new(store: Arc<S>, alerts: AlertSender) -> Self {
    let reconciler = Arc::new(Reconciler::new(store.clone(), alerts));
    Self {
      adjuster: Arc::new(Adjuster::new(store.clone())),
      scheduler: Scheduler::new(reconciler),
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: InventoryStore + 'static,
{
  Router::new()
    // Catalog
    .route("/products", get(products::list::<S>).post(products::create::<S>))
    .route("/products/{id}", get(products::get_one::<S>))
    // Ledger
    .route("/inventory/{product_id}", get(inventory::stock::<S>))
    .route("/inventory/{product_id}/events", get(inventory::events::<S>))
    .route("/inventory/{product_id}/adjust", post(inventory::adjust::<S>))
    // Audit
    .route("/reconciliations", get(audit::reconciliations::<S>))
    .route("/notifications", get(audit::notifications::<S>))
    // Jobs
    .route("/jobs/reconcile", post(jobs::reconcile::<S>))
    .route("/jobs/low-stock", post(jobs::low_stock::<S>))
    .with_state(state)
}
