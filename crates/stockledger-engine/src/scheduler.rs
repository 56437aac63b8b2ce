//! [`Scheduler`]: timer-driven and on-demand reconciliation jobs.
//!
//! Timers and manual triggers both go through [`Scheduler::run`], so the two
//! paths cannot behave differently. Every run is self-contained; nothing
//! about a job is persisted beyond the records the run itself writes.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockledger_core::store::InventoryStore;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use uuid::Uuid;

use crate::reconcile::{LowStockReport, Reconciler, RunReport};

// ─── Jobs ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
  /// Full sweep when `product_id` is `None`.
  Reconcile { product_id: Option<Uuid> },
  LowStockCheck,
}

/// Acknowledgement returned to a manual trigger before the job runs.
#[derive(Debug, Clone, Serialize)]
pub struct JobAccepted {
  pub job_id:      Uuid,
  pub job:         Job,
  pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum JobOutcome {
  Reconciled(RunReport),
  LowStockChecked(LowStockReport),
  Failed(String),
}

// ─── Config ──────────────────────────────────────────────────────────────────

/// The `[schedule]` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
  #[serde(default = "default_enabled")]
  pub enabled:                 bool,
  #[serde(default = "default_reconcile_interval")]
  pub reconcile_interval_secs: u64,
  #[serde(default = "default_low_stock_interval")]
  pub low_stock_interval_secs: u64,
}

impl Default for ScheduleConfig {
  fn default() -> Self {
    Self {
      enabled:                 default_enabled(),
      reconcile_interval_secs: default_reconcile_interval(),
      low_stock_interval_secs: default_low_stock_interval(),
    }
  }
}

fn default_enabled() -> bool { true }

/// Daily.
fn default_reconcile_interval() -> u64 { 24 * 60 * 60 }

/// Hourly.
fn default_low_stock_interval() -> u64 { 60 * 60 }

// ─── Scheduler ───────────────────────────────────────────────────────────────

pub struct Scheduler<S> {
  reconciler: Arc<Reconciler<S>>,
}

impl<S> Clone for Scheduler<S> {
  fn clone(&self) -> Self { Self { reconciler: self.reconciler.clone() } }
}

impl<S: InventoryStore + 'static> Scheduler<S> {
  pub fn new(reconciler: Arc<Reconciler<S>>) -> Self { Self { reconciler } }

  /// Start `job` in the background and acknowledge it immediately.
  pub fn trigger(&self, job: Job) -> JobAccepted {
    let accepted = JobAccepted { job_id: Uuid::new_v4(), job, accepted_at: Utc::now() };
    let this = self.clone();
    let job_id = accepted.job_id;
    tokio::spawn(async move {
      this.run(job_id, job).await;
    });
    tracing::info!(%job_id, ?job, "job accepted");
    accepted
  }

  /// Run `job` to completion. The single entry point for every job.
  pub async fn run(&self, job_id: Uuid, job: Job) -> JobOutcome {
    tracing::info!(%job_id, ?job, "job started");
    let outcome = match job {
      Job::Reconcile { product_id } => match self.reconciler.reconcile(product_id).await {
        Ok(report) => JobOutcome::Reconciled(report),
        Err(e) => JobOutcome::Failed(e.to_string()),
      },
      Job::LowStockCheck => match self.reconciler.check_low_stock().await {
        Ok(report) => JobOutcome::LowStockChecked(report),
        Err(e) => JobOutcome::Failed(e.to_string()),
      },
    };

    match &outcome {
      JobOutcome::Failed(error) => tracing::error!(%job_id, ?job, %error, "job failed"),
      _ => tracing::info!(%job_id, ?job, "job finished"),
    }
    outcome
  }

  /// Spawn the periodic jobs described by `cfg`.
  pub fn start(&self, cfg: &ScheduleConfig) -> ScheduleHandle {
    if !cfg.enabled {
      tracing::info!("scheduled jobs disabled");
      return ScheduleHandle { tasks: Vec::new() };
    }

    tracing::info!(
      reconcile_every_secs = cfg.reconcile_interval_secs,
      low_stock_every_secs = cfg.low_stock_interval_secs,
      "scheduled jobs started"
    );
    ScheduleHandle {
      tasks: vec![
        self.spawn_periodic(
          Duration::from_secs(cfg.reconcile_interval_secs.max(1)),
          Job::Reconcile { product_id: None },
        ),
        self.spawn_periodic(
          Duration::from_secs(cfg.low_stock_interval_secs.max(1)),
          Job::LowStockCheck,
        ),
      ],
    }
  }

  /// Run `job` every `period`, starting one period from now. Runs of the
  /// same timer never overlap; a slow run delays the next tick.
  pub fn spawn_periodic(&self, period: Duration, job: Job) -> JoinHandle<()> {
    let this = self.clone();
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      // The first tick completes immediately.
      ticker.tick().await;
      loop {
        ticker.tick().await;
        this.run(Uuid::new_v4(), job).await;
      }
    })
  }
}

/// Owns the periodic tasks; dropping it stops them.
pub struct ScheduleHandle {
  tasks: Vec<JoinHandle<()>>,
}

impl ScheduleHandle {
  pub fn shutdown(mut self) {
    for task in self.tasks.drain(..) {
      task.abort();
    }
    tracing::info!("scheduled jobs stopped");
  }

  pub fn is_running(&self) -> bool { self.tasks.iter().any(|t| !t.is_finished()) }
}

impl Drop for ScheduleHandle {
  fn drop(&mut self) {
    for task in &self.tasks {
      task.abort();
    }
  }
}
