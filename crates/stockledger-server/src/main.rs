//! stockledger server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, starts the alert consumer and scheduled jobs, and
//! serves the JSON API under `/api`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use stockledger_api::AppState;
use stockledger_notify::{Dispatcher, alert_channel, spawn_consumer};
use stockledger_server::{expand_tilde, load_config};
use stockledger_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "stockledger inventory server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let server_cfg = load_config(&cli.config).context("failed to load configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create store directory {parent:?}"))?;
  }

  // Open SQLite store.
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  // Alert pipeline: reconciliation -> bounded queue -> dispatcher.
  let dispatcher = Dispatcher::from_config(store.clone(), &server_cfg.notify)
    .context("failed to build notification dispatcher")?;
  let (alerts, alert_rx) = alert_channel(server_cfg.queue_capacity);
  let consumer = spawn_consumer(Arc::new(dispatcher), alert_rx);

  let state = AppState::new(store, alerts);
  let schedule = state.scheduler.start(&server_cfg.schedule);

  let app = stockledger_server::app(state);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // Stopping the timers and the router drops every alert sender, which lets
  // the consumer drain what is left and exit.
  schedule.shutdown();
  let handled = consumer.await.context("alert consumer panicked")?;
  tracing::info!(handled, "shutdown complete");

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutdown requested");
}
