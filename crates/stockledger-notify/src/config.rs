//! Notification configuration and provider selection.
//!
//! Providers are configured once at startup from this struct; there is no
//! process-wide provider state. Selection is a pure function of the config.

use serde::{Deserialize, Serialize};

// ─── ProviderKind ────────────────────────────────────────────────────────────

/// The closed set of email providers the dispatcher knows how to talk to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
  Resend,
  SendGrid,
}

impl ProviderKind {
  pub fn name(self) -> &'static str { self.into() }
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ResendConfig {
  pub api_key:  Option<String>,
  #[serde(default = "default_resend_url")]
  pub base_url: String,
}

impl Default for ResendConfig {
  fn default() -> Self { Self { api_key: None, base_url: default_resend_url() } }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendGridConfig {
  pub api_key:  Option<String>,
  #[serde(default = "default_sendgrid_url")]
  pub base_url: String,
}

impl Default for SendGridConfig {
  fn default() -> Self { Self { api_key: None, base_url: default_sendgrid_url() } }
}

/// The `[notify]` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
  /// Tried first when set and configured.
  pub preferred:       Option<ProviderKind>,
  #[serde(default = "default_from_address")]
  pub from_address:    String,
  /// Where alerts go when a message does not name its own recipient.
  pub alert_recipient: Option<String>,
  /// Per-request timeout. Zero is treated as one second.
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:    u64,
  #[serde(default)]
  pub resend:          ResendConfig,
  #[serde(default)]
  pub sendgrid:        SendGridConfig,
}

impl Default for NotifyConfig {
  fn default() -> Self {
    Self {
      preferred:       None,
      from_address:    default_from_address(),
      alert_recipient: None,
      timeout_secs:    default_timeout_secs(),
      resend:          ResendConfig::default(),
      sendgrid:        SendGridConfig::default(),
    }
  }
}

impl NotifyConfig {
  /// A provider is configured when its API key is present and non-empty.
  pub fn is_configured(&self, kind: ProviderKind) -> bool {
    let key = match kind {
      ProviderKind::Resend => self.resend.api_key.as_deref(),
      ProviderKind::SendGrid => self.sendgrid.api_key.as_deref(),
    };
    key.is_some_and(|k| !k.trim().is_empty())
  }
}

fn default_resend_url() -> String { "https://api.resend.com".into() }

fn default_sendgrid_url() -> String { "https://api.sendgrid.com".into() }

fn default_from_address() -> String { "inventory@localhost".into() }

fn default_timeout_secs() -> u64 { 30 }

// ─── Selection ───────────────────────────────────────────────────────────────

/// Which providers the dispatcher will use, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
  pub primary:  Option<ProviderKind>,
  pub fallback: Option<ProviderKind>,
}

/// Pick primary and fallback providers.
///
/// Preference order is the explicitly preferred provider followed by the
/// other one, or Resend before SendGrid when nothing is preferred. The first
/// configured provider in that order is primary and the next configured one
/// is the fallback.
pub fn select_providers(cfg: &NotifyConfig) -> Selection {
  let order = match cfg.preferred {
    Some(ProviderKind::SendGrid) => [ProviderKind::SendGrid, ProviderKind::Resend],
    Some(ProviderKind::Resend) | None => [ProviderKind::Resend, ProviderKind::SendGrid],
  };

  let mut configured = order.into_iter().filter(|k| cfg.is_configured(*k));
  Selection { primary: configured.next(), fallback: configured.next() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg(resend: Option<&str>, sendgrid: Option<&str>) -> NotifyConfig {
    NotifyConfig {
      resend: ResendConfig { api_key: resend.map(str::to_owned), ..Default::default() },
      sendgrid: SendGridConfig { api_key: sendgrid.map(str::to_owned), ..Default::default() },
      ..Default::default()
    }
  }

  #[test]
  fn nothing_configured_selects_nothing() {
    assert_eq!(select_providers(&cfg(None, None)), Selection::default());
  }

  #[test]
  fn blank_key_does_not_count_as_configured() {
    let selection = select_providers(&cfg(Some("  "), None));
    assert_eq!(selection.primary, None);
  }

  #[test]
  fn resend_is_primary_by_default() {
    let selection = select_providers(&cfg(Some("re_key"), Some("sg_key")));
    assert_eq!(selection.primary, Some(ProviderKind::Resend));
    assert_eq!(selection.fallback, Some(ProviderKind::SendGrid));
  }

  #[test]
  fn preferred_provider_goes_first() {
    let mut c = cfg(Some("re_key"), Some("sg_key"));
    c.preferred = Some(ProviderKind::SendGrid);
    let selection = select_providers(&c);
    assert_eq!(selection.primary, Some(ProviderKind::SendGrid));
    assert_eq!(selection.fallback, Some(ProviderKind::Resend));
  }

  #[test]
  fn unconfigured_preference_falls_through() {
    let mut c = cfg(Some("re_key"), None);
    c.preferred = Some(ProviderKind::SendGrid);
    let selection = select_providers(&c);
    assert_eq!(selection.primary, Some(ProviderKind::Resend));
    assert_eq!(selection.fallback, None);
  }

  #[test]
  fn provider_kind_parses_case_insensitively() {
    assert_eq!("SendGrid".parse::<ProviderKind>().unwrap(), ProviderKind::SendGrid);
    assert_eq!(ProviderKind::SendGrid.to_string(), "sendgrid");
    assert_eq!(ProviderKind::Resend.name(), "resend");
  }
}
