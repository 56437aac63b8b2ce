//! The `InventoryStore` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `stockledger-store-sqlite`). Higher layers (`stockledger-engine`,
//! `stockledger-notify`, `stockledger-api`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  audit::{NewReconciliation, ReconciliationRecord},
  event::{GuardedAppend, InventoryEvent, NewEvent},
  notification::{DeliveryOutcome, NotificationAttempt, NotificationStatus},
  product::{NewProduct, Product, ProductInsert},
};

/// Abstraction over a stockledger storage backend.
///
/// Inventory events are append-only: there is no operation that
/// updates or deletes one. Stock is never stored; callers fold the events
/// returned by the list operations.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait InventoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Products ──────────────────────────────────────────────────────────

  /// Insert a product. A slug already in use yields
  /// [`ProductInsert::SlugTaken`]; the check and the insert are atomic.
  fn add_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<ProductInsert, Self::Error>> + Send + '_;

  /// Retrieve a product by UUID. Returns `None` if not found.
  fn get_product(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  fn product_exists(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  // ── Events: append-only writes ───────────────────────────────────────

  /// Append an event unconditionally. `event_id`, `sequence` and
  /// `recorded_at` are assigned by the store.
  fn append_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<InventoryEvent, Self::Error>> + Send + '_;

  /// Append an event only if the product's stock after the append stays at
  /// or above `floor`.
  ///
  /// The read of the current stock and the insert are atomic with respect to
  /// every other append on the same store, so concurrent callers cannot both
  /// pass the check against the same stale balance.
  fn append_event_guarded(
    &self,
    input: NewEvent,
    floor: i64,
  ) -> impl Future<Output = Result<GuardedAppend, Self::Error>> + Send + '_;

  // ── Events: reads ────────────────────────────────────────────────────

  /// All events for one product in append order (`sequence`). `recorded_at`
  /// is assigned at insert time, so it never decreases along that order.
  /// Every call returns a fresh snapshot taken at call time.
  fn list_events_by_product(
    &self,
    product_id: Uuid,
  ) -> impl Future<Output = Result<Vec<InventoryEvent>, Self::Error>> + Send + '_;

  /// Events across all products in the same total order, optionally
  /// restricted to one product.
  fn list_events(
    &self,
    product_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<InventoryEvent>, Self::Error>> + Send + '_;

  // ── Reconciliation audit ──────────────────────────────────────────────

  fn record_reconciliation(
    &self,
    input: NewReconciliation,
  ) -> impl Future<Output = Result<ReconciliationRecord, Self::Error>> + Send + '_;

  /// Most recent records first.
  fn list_reconciliations(
    &self,
    product_id: Option<Uuid>,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<ReconciliationRecord>, Self::Error>> + Send + '_;

  fn count_reconciliations(
    &self,
    product_id: Option<Uuid>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Notification attempts ─────────────────────────────────────────────

  /// Persist a freshly created attempt (normally `Pending`).
  fn record_notification(
    &self,
    attempt: NotificationAttempt,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Move a `Pending` attempt to its terminal state.
  ///
  /// Returns an error if the attempt does not exist or has already left
  /// `Pending`.
  fn finish_notification(
    &self,
    attempt_id: Uuid,
    outcome: DeliveryOutcome,
  ) -> impl Future<Output = Result<NotificationAttempt, Self::Error>> + Send + '_;

  /// Most recent attempts first.
  fn list_notifications(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<NotificationAttempt>, Self::Error>> + Send + '_;

  fn count_notifications(
    &self,
    status: Option<NotificationStatus>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
