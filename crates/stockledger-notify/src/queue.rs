//! Bounded in-process alert queue.
//!
//! Producers (the reconciliation worker) never wait on delivery: they
//! `try_send` and move on. A single consumer task drains the queue and hands
//! each message to the [`Dispatcher`], one at a time.

use std::sync::Arc;

use stockledger_core::store::InventoryStore;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{AlertMessage, Dispatcher, EnqueueError, EmailProvider};

/// Producer half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AlertSender {
  tx: mpsc::Sender<AlertMessage>,
}

/// Consumer half.
#[derive(Debug)]
pub struct AlertReceiver {
  rx: mpsc::Receiver<AlertMessage>,
}

/// Create a queue holding at most `capacity` undelivered alerts.
pub fn alert_channel(capacity: usize) -> (AlertSender, AlertReceiver) {
  let (tx, rx) = mpsc::channel(capacity.max(1));
  (AlertSender { tx }, AlertReceiver { rx })
}

impl AlertSender {
  /// Queue `message` without waiting.
  pub fn enqueue(&self, message: AlertMessage) -> Result<(), EnqueueError> {
    self.tx.try_send(message).map_err(|e| match e {
      mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
      mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
    })
  }
}

impl AlertReceiver {
  /// Next queued alert; `None` once every sender has been dropped.
  pub async fn recv(&mut self) -> Option<AlertMessage> { self.rx.recv().await }

  /// Next queued alert if one is waiting right now.
  pub fn try_recv(&mut self) -> Option<AlertMessage> { self.rx.try_recv().ok() }
}

/// Drain `receiver` into `dispatcher` until all senders are gone.
///
/// The task resolves to the number of messages handled. Each message is
/// dispatched independently; one failed delivery never stops the loop.
pub fn spawn_consumer<S, P>(
  dispatcher: Arc<Dispatcher<S, P>>,
  mut receiver: AlertReceiver,
) -> JoinHandle<usize>
where
  S: InventoryStore + 'static,
  P: EmailProvider + 'static,
{
  tokio::spawn(async move {
    let mut handled = 0;
    while let Some(message) = receiver.recv().await {
      let attempt = dispatcher.send(message).await;
      tracing::debug!(
        attempt_id = %attempt.attempt_id,
        status = %attempt.status,
        "alert dispatched"
      );
      handled += 1;
    }
    tracing::info!(handled, "alert queue closed");
    handled
  })
}

#[cfg(test)]
mod tests {
  use stockledger_core::{
    notification::NotificationStatus, stock::LowStockSignal, store::InventoryStore as _,
  };
  use stockledger_store_sqlite::SqliteStore;

  use super::*;
  use crate::Provider;

  fn message(name: &str) -> AlertMessage {
    AlertMessage::low_stock(&LowStockSignal {
      product_id:    Default::default(),
      product_name:  name.into(),
      current_stock: 1,
    })
  }

  #[tokio::test]
  async fn enqueue_reports_full_queue() {
    let (tx, _rx) = alert_channel(1);
    tx.enqueue(message("a")).unwrap();
    assert_eq!(tx.enqueue(message("b")), Err(EnqueueError::Full));
  }

  #[tokio::test]
  async fn enqueue_reports_closed_queue() {
    let (tx, rx) = alert_channel(4);
    drop(rx);
    assert_eq!(tx.enqueue(message("a")), Err(EnqueueError::Closed));
  }

  #[tokio::test]
  async fn consumer_dispatches_every_message_then_exits() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let dispatcher: Dispatcher<SqliteStore, Provider> = Dispatcher::new(store.clone(), None, None);
    let (tx, rx) = alert_channel(8);

    let consumer = spawn_consumer(Arc::new(dispatcher), rx);
    tx.enqueue(message("a")).unwrap();
    tx.enqueue(message("b")).unwrap();
    drop(tx);

    assert_eq!(consumer.await.unwrap(), 2);
    // No provider is configured, so both are recorded as failed.
    assert_eq!(store.count_notifications(Some(NotificationStatus::Failed)).await.unwrap(), 2);
  }
}
