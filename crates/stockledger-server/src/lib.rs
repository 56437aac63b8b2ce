//! Server wiring for stockledger: configuration loading and the top-level
//! HTTP application.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
};

use axum::Router;
use serde::Deserialize;
use stockledger_api::AppState;
use stockledger_core::store::InventoryStore;
use stockledger_engine::ScheduleConfig;
use stockledger_notify::NotifyConfig;
use tower_http::trace::TraceLayer;

/// Environment variable prefix, e.g. `STOCKLEDGER_PORT`.
pub const ENV_PREFIX: &str = "STOCKLEDGER";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// environment. Nested keys use `__`, as in
/// `STOCKLEDGER_NOTIFY__RESEND__API_KEY`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Undelivered alerts held before new ones are dropped.
  #[serde(default = "default_queue_capacity")]
  pub queue_capacity: usize,
  #[serde(default)]
  pub schedule:       ScheduleConfig,
  #[serde(default)]
  pub notify:         NotifyConfig,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/stockledger/ledger.db") }

fn default_queue_capacity() -> usize { 256 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Load configuration from `path` (optional) layered under the process
/// environment.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  build_config(path, None)
}

/// Like [`load_config`] but with an explicit environment instead of the
/// process one.
pub fn load_config_with_env(
  path: &Path,
  env: HashMap<String, String>,
) -> Result<ServerConfig, config::ConfigError> {
  build_config(path, Some(env))
}

fn build_config(
  path: &Path,
  env: Option<HashMap<String, String>>,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .source(env),
    )
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The full HTTP application: the API nested under `/api` with request
/// tracing.
pub fn app<S>(state: AppState<S>) -> Router
where
  S: InventoryStore + 'static,
{
  Router::new()
    .nest("/api", stockledger_api::api_router(state))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use stockledger_notify::{ProviderKind, alert_channel};
  use stockledger_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn write_config(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("stockledger-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn missing_file_yields_defaults() {
    let cfg = load_config_with_env(Path::new("/nonexistent/stockledger.toml"), HashMap::new()).unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.queue_capacity, 256);
    assert!(cfg.schedule.enabled);
    assert_eq!(cfg.schedule.reconcile_interval_secs, 86_400);
    assert_eq!(cfg.schedule.low_stock_interval_secs, 3_600);
    assert!(cfg.notify.preferred.is_none());
    assert_eq!(cfg.notify.timeout_secs, 30);
  }

  #[test]
  fn file_sections_are_read() {
    let path = write_config(
      r#"
port = 9000
store_path = "/tmp/ledger.db"

[schedule]
enabled = false
low_stock_interval_secs = 60

[notify]
preferred = "sendgrid"
alert_recipient = "ops@example.com"

[notify.sendgrid]
api_key = "SG.test"
"#,
    );

    let cfg = load_config_with_env(&path, HashMap::new()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/ledger.db"));
    assert!(!cfg.schedule.enabled);
    assert_eq!(cfg.schedule.low_stock_interval_secs, 60);
    assert_eq!(cfg.schedule.reconcile_interval_secs, 86_400);
    assert_eq!(cfg.notify.preferred, Some(ProviderKind::SendGrid));
    assert_eq!(cfg.notify.alert_recipient.as_deref(), Some("ops@example.com"));
    assert!(cfg.notify.is_configured(ProviderKind::SendGrid));
    assert!(!cfg.notify.is_configured(ProviderKind::Resend));
  }

  #[test]
  fn environment_overrides_file() {
    let path = write_config("port = 9000\n");
    let env = HashMap::from([
      ("STOCKLEDGER_PORT".to_string(), "9100".to_string()),
      ("STOCKLEDGER_NOTIFY__RESEND__API_KEY".to_string(), "re_test".to_string()),
    ]);

    let cfg = load_config_with_env(&path, env).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.notify.resend.api_key.as_deref(), Some("re_test"));
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/ledger.db")), PathBuf::from(home).join("ledger.db"));
    assert_eq!(expand_tilde(Path::new("/abs/ledger.db")), PathBuf::from("/abs/ledger.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let (tx, _rx) = alert_channel(4);
    let app = app(AppState::new(store, tx));

    let resp = app
      .clone()
      .oneshot(Request::get("/api/products").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/products").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
