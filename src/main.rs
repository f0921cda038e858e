mod app;
mod auth;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod midday;
mod query;
mod timer;
mod ui;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "m9s")]
#[command(about = "A terminal UI for the Midday finance platform, inspired by k9s")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/m9s/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// View to open at startup (transactions, customers, invoices,
  /// vault, tracker, search, spendings)
  #[arg(short, long)]
  view: Option<String>,
}

/// File logging; a TUI owns stdout, so tracing goes to a rolling file
/// under the data dir. The guard must outlive the app or buffered
/// lines are lost.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .ok_or_else(|| eyre!("no data directory available"))?
    .join("m9s")
    .join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::daily(log_dir, "m9s.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env("M9S_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _log_guard = init_tracing()?;

  let args = Args::parse();
  let config = config::Config::load(args.config.as_deref())?;

  let token = auth::TokenStore::from_env();
  let client = midday::client::MiddayClient::new(&config, token)?;
  let cache = cache::CacheLayer::new(config.cache.into());
  let cached = midday::cached_client::CachedMiddayClient::new(client, cache);

  let store = timer::TimerStore::open()?;
  let interval = timer::IntervalCache::new(store);
  let reconciler = timer::TimerReconciler::new(interval, config.timer.into());

  let mut app = app::App::new(config, cached, reconciler, args.view.as_deref());
  app.run().await?;

  Ok(())
}
