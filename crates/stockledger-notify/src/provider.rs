//! The email provider abstraction.

use std::future::Future;

use reqwest::Client;

use crate::{
  config::{NotifyConfig, ProviderKind},
  resend::ResendProvider,
  sendgrid::SendGridProvider,
};

/// Result of one delivery call. A provider never panics or errors out of
/// `send`; transport and API failures come back as [`Delivery::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
  Sent { message_id: Option<String> },
  Failed { error: String },
}

impl Delivery {
  pub fn failed(error: impl Into<String>) -> Self { Self::Failed { error: error.into() } }

  pub fn is_sent(&self) -> bool { matches!(self, Self::Sent { .. }) }
}

/// Capability set shared by every email provider.
pub trait EmailProvider: Send + Sync {
  /// Stable lowercase name recorded on notification attempts.
  fn name(&self) -> &str;

  /// Whether the credentials this provider needs are present.
  fn is_configured(&self) -> bool;

  fn send<'a>(
    &'a self,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
  ) -> impl Future<Output = Delivery> + Send + 'a;
}

/// The two concrete providers.
#[derive(Debug, Clone)]
pub enum Provider {
  Resend(ResendProvider),
  SendGrid(SendGridProvider),
}

impl Provider {
  /// Build the provider of `kind` from its section of `cfg`.
  pub fn build(kind: ProviderKind, cfg: &NotifyConfig, client: Client) -> Self {
    match kind {
      ProviderKind::Resend => {
        Self::Resend(ResendProvider::new(&cfg.resend, &cfg.from_address, client))
      }
      ProviderKind::SendGrid => {
        Self::SendGrid(SendGridProvider::new(&cfg.sendgrid, &cfg.from_address, client))
      }
    }
  }

  pub fn kind(&self) -> ProviderKind {
    match self {
      Self::Resend(_) => ProviderKind::Resend,
      Self::SendGrid(_) => ProviderKind::SendGrid,
    }
  }
}

impl EmailProvider for Provider {
  fn name(&self) -> &str { self.kind().name() }

  fn is_configured(&self) -> bool {
    match self {
      Self::Resend(p) => p.is_configured(),
      Self::SendGrid(p) => p.is_configured(),
    }
  }

  async fn send(&self, to: &str, subject: &str, html: &str) -> Delivery {
    match self {
      Self::Resend(p) => p.deliver(to, subject, html).await,
      Self::SendGrid(p) => p.deliver(to, subject, html).await,
    }
  }
}
