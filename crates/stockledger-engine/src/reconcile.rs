//! [`Reconciler`]: recompute, audit, and flag low stock.
//!
//! A run walks one product or every product. For each it folds the ledger,
//! writes a [`ReconciliationRecord`](stockledger_core::audit::ReconciliationRecord)
//! and, if stock is at or below the threshold, queues an alert. Queueing
//! never waits on delivery, and a failure on one product is logged and
//! counted without stopping the sweep.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use stockledger_core::{
  audit::{NewReconciliation, ReconciliationRecord},
  product::Product,
  stock::{self, LOW_STOCK_THRESHOLD, LowStockSignal},
  store::InventoryStore,
};
use stockledger_notify::{AlertMessage, AlertSender};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "product_id", rename_all = "snake_case")]
pub enum RunScope {
  Product(Uuid),
  All,
}

/// Summary of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub run_id:     Uuid,
  pub scope:      RunScope,
  /// Products for which a record was written.
  pub reconciled: usize,
  /// Products whose processing failed; see the logs for details.
  pub failed:     usize,
  pub low_stock:  Vec<LowStockSignal>,
  /// Alerts actually placed on the queue.
  pub enqueued:   usize,
}

/// Summary of one low-stock sweep.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockReport {
  pub low_stock: Vec<LowStockSignal>,
  /// Whether the consolidated alert made it onto the queue.
  pub enqueued:  bool,
}

pub struct Reconciler<S> {
  store:  Arc<S>,
  alerts: AlertSender,
}

impl<S: InventoryStore> Reconciler<S> {
  pub fn new(store: Arc<S>, alerts: AlertSender) -> Self { Self { store, alerts } }

  /// Reconcile `product_id`, or every product when `None`.
  ///
  /// Only failing to find the products to work on fails the run; per-product
  /// errors are logged and counted in [`RunReport::failed`].
  pub async fn reconcile(&self, product_id: Option<Uuid>) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let (scope, products) = match product_id {
      Some(id) => {
        let product = self
          .store
          .get_product(id)
          .await
          .map_err(Error::storage)?
          .ok_or(Error::ProductNotFound(id))?;
        (RunScope::Product(id), vec![product])
      }
      None => (RunScope::All, self.store.list_products().await.map_err(Error::storage)?),
    };

    tracing::info!(%run_id, ?scope, products = products.len(), "reconciliation started");

    let mut report = RunReport {
      run_id,
      scope,
      reconciled: 0,
      failed: 0,
      low_stock: Vec::new(),
      enqueued: 0,
    };

    for product in &products {
      match self.reconcile_product(run_id, product).await {
        Ok(record) => {
          report.reconciled += 1;
          if record.low_stock {
            let signal = LowStockSignal {
              product_id:    product.product_id,
              product_name:  product.name.clone(),
              current_stock: record.calculated_stock,
            };
            if self.enqueue(AlertMessage::low_stock(&signal)) {
              report.enqueued += 1;
            }
            report.low_stock.push(signal);
          }
        }
        Err(e) => {
          report.failed += 1;
          tracing::error!(%run_id, product_id = %product.product_id, error = %e, "reconciliation failed for product");
        }
      }
    }

    tracing::info!(
      %run_id,
      reconciled = report.reconciled,
      failed = report.failed,
      low_stock = report.low_stock.len(),
      "reconciliation completed"
    );
    Ok(report)
  }

  async fn reconcile_product(&self, run_id: Uuid, product: &Product) -> Result<ReconciliationRecord> {
    let events = self
      .store
      .list_events_by_product(product.product_id)
      .await
      .map_err(Error::storage)?;

    let calculated = stock::current_stock(&events);
    let low_stock = stock::is_low_stock(calculated, LOW_STOCK_THRESHOLD);

    let record = self
      .store
      .record_reconciliation(NewReconciliation {
        run_id,
        product_id: product.product_id,
        calculated_stock: calculated,
        event_count: events.len() as i64,
        low_stock,
        description: format!(
          "Reconciled stock for {}: {calculated} units from {} events",
          product.name,
          events.len()
        ),
      })
      .await
      .map_err(Error::storage)?;

    tracing::debug!(%run_id, product_id = %product.product_id, calculated, low_stock, "product reconciled");
    Ok(record)
  }

  /// Cheap sweep: fold every product's ledger from a single read, write no
  /// records, and queue one consolidated alert if anything is low.
  pub async fn check_low_stock(&self) -> Result<LowStockReport> {
    let products = self.store.list_products().await.map_err(Error::storage)?;
    let events = self.store.list_events(None).await.map_err(Error::storage)?;

    let mut deltas: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for event in &events {
      deltas.entry(event.product_id).or_default().push(event.delta);
    }

    let mut low_stock: Vec<LowStockSignal> = products
      .into_iter()
      .filter_map(|p| {
        let current = stock::fold_deltas(deltas.remove(&p.product_id).unwrap_or_default());
        stock::is_low_stock(current, LOW_STOCK_THRESHOLD).then(|| LowStockSignal {
          product_id:    p.product_id,
          product_name:  p.name,
          current_stock: current,
        })
      })
      .collect();
    low_stock.sort_by(|a, b| {
      a.current_stock
        .cmp(&b.current_stock)
        .then_with(|| a.product_name.cmp(&b.product_name))
    });

    let enqueued = !low_stock.is_empty() && self.enqueue(AlertMessage::low_stock_digest(&low_stock));

    tracing::info!(low_stock = low_stock.len(), enqueued, "low-stock check completed");
    Ok(LowStockReport { low_stock, enqueued })
  }

  fn enqueue(&self, message: AlertMessage) -> bool {
    match self.alerts.enqueue(message) {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(error = %e, "could not queue low-stock alert");
        false
      }
    }
  }
}
