//! [`Dispatcher`]: primary/fallback delivery with recorded outcomes.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use stockledger_core::{
  notification::{DeliveryOutcome, NotificationAttempt},
  store::InventoryStore,
};

use crate::{
  AlertMessage, Result,
  config::{NotifyConfig, select_providers},
  provider::{Delivery, EmailProvider, Provider},
};

/// Delivers alerts and records one [`NotificationAttempt`] per message.
///
/// Delivery is tried once through the primary provider and, if that reports
/// failure, once through the fallback. There is no third try and no backoff;
/// retrying is the job scheduler's business.
pub struct Dispatcher<S, P = Provider> {
  store:             Arc<S>,
  primary:           Option<P>,
  fallback:          Option<P>,
  default_recipient: Option<String>,
}

impl<S: InventoryStore> Dispatcher<S, Provider> {
  /// Build the dispatcher from configuration, selecting providers with
  /// [`select_providers`].
  pub fn from_config(store: Arc<S>, cfg: &NotifyConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
      .build()?;

    let selection = select_providers(cfg);
    let primary = selection.primary.map(|k| Provider::build(k, cfg, client.clone()));
    let fallback = selection.fallback.map(|k| Provider::build(k, cfg, client.clone()));

    match (&primary, &fallback) {
      (None, _) => tracing::warn!("no email provider configured; alerts will be recorded as failed"),
      (Some(p), None) => tracing::info!(primary = p.name(), "email provider selected"),
      (Some(p), Some(f)) => {
        tracing::info!(primary = p.name(), fallback = f.name(), "email providers selected")
      }
    }

    Ok(Self::new(store, primary, fallback).with_default_recipient(cfg.alert_recipient.clone()))
  }
}

impl<S, P> Dispatcher<S, P>
where
  S: InventoryStore,
  P: EmailProvider,
{
  /// A lone fallback is promoted to primary.
  pub fn new(store: Arc<S>, primary: Option<P>, fallback: Option<P>) -> Self {
    let (primary, fallback) = match primary {
      Some(p) => (Some(p), fallback),
      None => (fallback, None),
    };
    Self { store, primary, fallback, default_recipient: None }
  }

  pub fn with_default_recipient(mut self, recipient: Option<String>) -> Self {
    self.default_recipient = recipient.filter(|r| !r.trim().is_empty());
    self
  }

  pub fn primary_name(&self) -> Option<&str> { self.primary.as_ref().map(|p| p.name()) }

  pub fn fallback_name(&self) -> Option<&str> { self.fallback.as_ref().map(|p| p.name()) }

  /// Deliver `message` and return the recorded attempt.
  ///
  /// Never fails: a missing provider, a missing recipient or a rejected
  /// delivery all produce a `FAILED` attempt. Store errors while recording
  /// are logged and the in-memory attempt is returned regardless.
  pub async fn send(&self, message: AlertMessage) -> NotificationAttempt {
    let recipient = message
      .recipient
      .clone()
      .or_else(|| self.default_recipient.clone());

    let mut attempt = NotificationAttempt::pending(
      message.kind,
      recipient.clone().unwrap_or_default(),
      message.subject.clone(),
    );

    if let Err(e) = self.store.record_notification(attempt.clone()).await {
      tracing::warn!(attempt_id = %attempt.attempt_id, error = %e, "failed to record notification attempt");
    }

    let outcome = match (&self.primary, recipient) {
      (None, _) => DeliveryOutcome::Failed {
        provider: None,
        error:    "no provider configured".into(),
      },
      (Some(_), None) => DeliveryOutcome::Failed {
        provider: None,
        error:    "no recipient configured".into(),
      },
      (Some(primary), Some(to)) => self.deliver(primary, &to, &message).await,
    };

    match &outcome {
      DeliveryOutcome::Sent { provider, .. } => {
        tracing::info!(attempt_id = %attempt.attempt_id, provider = %provider, subject = %message.subject, "alert sent")
      }
      DeliveryOutcome::Failed { provider, error } => {
        tracing::warn!(attempt_id = %attempt.attempt_id, provider = ?provider, error = %error, "alert delivery failed")
      }
    }

    match self.store.finish_notification(attempt.attempt_id, outcome.clone()).await {
      Ok(stored) => stored,
      Err(e) => {
        tracing::warn!(attempt_id = %attempt.attempt_id, error = %e, "failed to record notification outcome");
        attempt.finish(&outcome);
        attempt
      }
    }
  }

  async fn deliver(&self, primary: &P, to: &str, message: &AlertMessage) -> DeliveryOutcome {
    let first = primary.send(to, &message.subject, &message.html).await;

    let (provider, delivery) = match (first, &self.fallback) {
      (Delivery::Failed { error }, Some(fallback)) => {
        tracing::warn!(
          primary = primary.name(),
          fallback = fallback.name(),
          error = %error,
          "primary provider failed; trying fallback"
        );
        (fallback.name(), fallback.send(to, &message.subject, &message.html).await)
      }
      (delivery, _) => (primary.name(), delivery),
    };

    match delivery {
      Delivery::Sent { message_id } => DeliveryOutcome::Sent {
        provider: provider.to_owned(),
        message_id,
        at: Utc::now(),
      },
      Delivery::Failed { error } => DeliveryOutcome::Failed {
        provider: Some(provider.to_owned()),
        error,
      },
    }
  }
}
