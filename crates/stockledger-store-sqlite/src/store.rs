//! [`SqliteStore`]: the SQLite implementation of [`InventoryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use stockledger_core::{
  audit::{NewReconciliation, ReconciliationRecord},
  event::{GuardedAppend, InventoryEvent, NewEvent},
  notification::{DeliveryOutcome, NotificationAttempt, NotificationStatus},
  product::{NewProduct, Product, ProductInsert},
  stock,
  store::InventoryStore,
};

use crate::{
  Error, Result,
  encode::{
    RawEvent, RawNotification, RawProduct, RawReconciliation, encode_dt, encode_limit,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An inventory store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Every call
/// runs on the connection's single background thread, which is what makes
/// [`InventoryStore::append_event_guarded`] atomic across tasks.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What the guarded-append closure hands back from the connection thread.
enum GuardedRow {
  Appended { sequence: i64, previous: i64, recorded_at: DateTime<Utc> },
  Rejected { current: i64 },
}

/// What the finish-notification closure hands back from the connection thread.
enum FinishRow {
  Missing,
  AlreadyFinished,
  Finished(RawNotification),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Insert `event`, returning its sequence and timestamp. Both are assigned
  /// on the connection thread so `recorded_at` never runs backwards against
  /// `sequence`.
  async fn insert_event(&self, event: &InventoryEvent) -> Result<(i64, DateTime<Utc>)> {
    let event_id_str   = encode_uuid(event.event_id);
    let product_id_str = encode_uuid(event.product_id);
    let delta          = event.delta;
    let reason         = event.reason.as_str().to_owned();
    let actor          = event.actor.clone();

    let stamped = self
      .conn
      .call(move |conn| {
        let recorded_at = Utc::now();
        conn.execute(
          "INSERT INTO inventory_events (event_id, product_id, delta, reason, actor, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            event_id_str,
            product_id_str,
            delta,
            reason,
            actor,
            encode_dt(recorded_at)
          ],
        )?;
        Ok((conn.last_insert_rowid(), recorded_at))
      })
      .await?;
    Ok(stamped)
  }
}

/// `sequence` and `recorded_at` are placeholders until the insert assigns them.
fn build_event(input: NewEvent) -> InventoryEvent {
  InventoryEvent {
    event_id:    Uuid::new_v4(),
    sequence:    0,
    product_id:  input.product_id,
    delta:       input.delta,
    reason:      input.reason,
    actor:       input.actor,
    recorded_at: Utc::now(),
  }
}

// ─── InventoryStore impl ─────────────────────────────────────────────────────

impl InventoryStore for SqliteStore {
  type Error = Error;

  // ── Products ──────────────────────────────────────────────────────────────

  async fn add_product(&self, input: NewProduct) -> Result<ProductInsert> {
    let product = Product {
      product_id: Uuid::new_v4(),
      name:       input.name,
      slug:       input.slug,
      created_at: Utc::now(),
    };

    let id_str = encode_uuid(product.product_id);
    let name   = product.name.clone();
    let slug   = product.slug.clone();
    let at_str = encode_dt(product.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO products (product_id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, name, slug, at_str],
        ) {
          Ok(_) => Ok(true),
          // The only UNIQUE column besides the primary key is `slug`.
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
          {
            Ok(false)
          }
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      tracing::debug!(slug = %product.slug, "product slug already taken");
      return Ok(ProductInsert::SlugTaken);
    }
    Ok(ProductInsert::Created(product))
  }

  async fn get_product(&self, id: Uuid) -> Result<Option<Product>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawProduct> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {} FROM products WHERE product_id = ?1", RawProduct::COLUMNS),
            rusqlite::params![id_str],
            RawProduct::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawProduct::into_product).transpose()
  }

  async fn product_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT 1 FROM products WHERE product_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false))
      })
      .await?;

    Ok(exists)
  }

  async fn list_products(&self) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM products ORDER BY created_at, product_id",
          RawProduct::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawProduct::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  // ── Events: append-only writes ───────────────────────────────────────────

  async fn append_event(&self, input: NewEvent) -> Result<InventoryEvent> {
    let mut event = build_event(input);
    (event.sequence, event.recorded_at) = self.insert_event(&event).await?;
    Ok(event)
  }

  async fn append_event_guarded(
    &self,
    input: NewEvent,
    floor: i64,
  ) -> Result<GuardedAppend> {
    let mut event = build_event(input);

    let event_id_str   = encode_uuid(event.event_id);
    let product_id_str = encode_uuid(event.product_id);
    let delta          = event.delta;
    let reason         = event.reason.as_str().to_owned();
    let actor          = event.actor.clone();

    let row = self
      .conn
      .call(move |conn| {
        // IMMEDIATE takes the write lock before the read, so no other writer
        // (including another process on the same file) can slip an event in
        // between the fold and the insert.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = {
          let mut stmt = tx.prepare(
            "SELECT delta FROM inventory_events
             WHERE product_id = ?1
             ORDER BY sequence",
          )?;
          let deltas = stmt
            .query_map(rusqlite::params![product_id_str], |r| r.get::<_, i32>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          stock::fold_deltas(deltas)
        };

        if previous + i64::from(delta) < floor {
          // Dropping `tx` rolls back; nothing was written.
          return Ok(GuardedRow::Rejected { current: previous });
        }

        let recorded_at = Utc::now();
        tx.execute(
          "INSERT INTO inventory_events (event_id, product_id, delta, reason, actor, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            event_id_str,
            product_id_str,
            delta,
            reason,
            actor,
            encode_dt(recorded_at)
          ],
        )?;
        let sequence = tx.last_insert_rowid();
        tx.commit()?;

        Ok(GuardedRow::Appended { sequence, previous, recorded_at })
      })
      .await?;

    Ok(match row {
      GuardedRow::Appended { sequence, previous, recorded_at } => {
        event.sequence = sequence;
        event.recorded_at = recorded_at;
        GuardedAppend::Appended { event, previous_stock: previous }
      }
      GuardedRow::Rejected { current } => {
        tracing::debug!(
          product_id = %event.product_id,
          current,
          delta,
          floor,
          "guarded append rejected"
        );
        GuardedAppend::Rejected { current_stock: current }
      }
    })
  }

  // ── Events: reads ────────────────────────────────────────────────────────

  async fn list_events_by_product(&self, product_id: Uuid) -> Result<Vec<InventoryEvent>> {
    self.list_events(Some(product_id)).await
  }

  async fn list_events(&self, product_id: Option<Uuid>) -> Result<Vec<InventoryEvent>> {
    let product_id_str = product_id.map(encode_uuid);

    let raws: Vec<RawEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM inventory_events
           WHERE ?1 IS NULL OR product_id = ?1
           ORDER BY sequence",
          RawEvent::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![product_id_str], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  // ── Reconciliation audit ──────────────────────────────────────────────────

  async fn record_reconciliation(
    &self,
    input: NewReconciliation,
  ) -> Result<ReconciliationRecord> {
    let record = ReconciliationRecord {
      record_id:        Uuid::new_v4(),
      run_id:           input.run_id,
      product_id:       input.product_id,
      calculated_stock: input.calculated_stock,
      event_count:      input.event_count,
      low_stock:        input.low_stock,
      description:      input.description,
      recorded_at:      Utc::now(),
    };

    let record_id_str  = encode_uuid(record.record_id);
    let run_id_str     = encode_uuid(record.run_id);
    let product_id_str = encode_uuid(record.product_id);
    let calculated     = record.calculated_stock;
    let count          = record.event_count;
    let low            = record.low_stock;
    let description    = record.description.clone();
    let at_str         = encode_dt(record.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reconciliations (
             record_id, run_id, product_id, calculated_stock,
             event_count, low_stock, description, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            record_id_str,
            run_id_str,
            product_id_str,
            calculated,
            count,
            low,
            description,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn list_reconciliations(
    &self,
    product_id: Option<Uuid>,
    limit:      Option<usize>,
  ) -> Result<Vec<ReconciliationRecord>> {
    let product_id_str = product_id.map(encode_uuid);
    let limit_val      = encode_limit(limit);

    let raws: Vec<RawReconciliation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM reconciliations
           WHERE ?1 IS NULL OR product_id = ?1
           ORDER BY recorded_at DESC, rowid DESC
           LIMIT ?2",
          RawReconciliation::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![product_id_str, limit_val],
            RawReconciliation::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReconciliation::into_record).collect()
  }

  async fn count_reconciliations(&self, product_id: Option<Uuid>) -> Result<u64> {
    let product_id_str = product_id.map(encode_uuid);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM reconciliations WHERE ?1 IS NULL OR product_id = ?1",
          rusqlite::params![product_id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  // ── Notification attempts ─────────────────────────────────────────────────

  async fn record_notification(&self, attempt: NotificationAttempt) -> Result<()> {
    let id_str      = encode_uuid(attempt.attempt_id);
    let kind        = attempt.kind.as_str();
    let status      = attempt.status.as_str();
    let created_str = encode_dt(attempt.created_at);
    let sent_str    = attempt.sent_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notification_attempts (
             attempt_id, kind, recipient, subject, status,
             provider, message_id, error, created_at, sent_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            kind,
            attempt.recipient,
            attempt.subject,
            status,
            attempt.provider,
            attempt.message_id,
            attempt.error,
            created_str,
            sent_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn finish_notification(
    &self,
    attempt_id: Uuid,
    outcome:    DeliveryOutcome,
  ) -> Result<NotificationAttempt> {
    let id_str = encode_uuid(attempt_id);
    let status = outcome.status().as_str();
    let (provider, message_id, error, sent_str) = match outcome {
      DeliveryOutcome::Sent { provider, message_id, at } => {
        (Some(provider), message_id, None, Some(encode_dt(at)))
      }
      DeliveryOutcome::Failed { provider, error } => (provider, None, Some(error), None),
    };

    let row = self
      .conn
      .call(move |conn| {
        // The `status = 'PENDING'` guard makes the transition happen at most
        // once even if two finishers race.
        let changed = conn.execute(
          "UPDATE notification_attempts
           SET status = ?2, provider = ?3, message_id = ?4, error = ?5, sent_at = ?6
           WHERE attempt_id = ?1 AND status = 'PENDING'",
          rusqlite::params![id_str, status, provider, message_id, error, sent_str],
        )?;

        let raw = conn
          .query_row(
            &format!(
              "SELECT {} FROM notification_attempts WHERE attempt_id = ?1",
              RawNotification::COLUMNS
            ),
            rusqlite::params![id_str],
            RawNotification::from_row,
          )
          .optional()?;

        Ok(match (changed, raw) {
          (_, None) => FinishRow::Missing,
          (0, Some(_)) => FinishRow::AlreadyFinished,
          (_, Some(raw)) => FinishRow::Finished(raw),
        })
      })
      .await?;

    match row {
      FinishRow::Missing => Err(Error::NotificationNotFound(attempt_id)),
      FinishRow::AlreadyFinished => Err(Error::AlreadyFinished(attempt_id)),
      FinishRow::Finished(raw) => raw.into_attempt(),
    }
  }

  async fn list_notifications(
    &self,
    limit: Option<usize>,
  ) -> Result<Vec<NotificationAttempt>> {
    let limit_val = encode_limit(limit);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM notification_attempts
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?1",
          RawNotification::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawNotification::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_attempt).collect()
  }

  async fn count_notifications(&self, status: Option<NotificationStatus>) -> Result<u64> {
    let status_str = status.map(NotificationStatus::as_str);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notification_attempts WHERE ?1 IS NULL OR status = ?1",
          rusqlite::params![status_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }
}
