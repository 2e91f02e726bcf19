//! headcount server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite event log, and serves the JSON API over HTTP.
//!
//! # Demo data
//!
//! To fill a fresh store with a handful of scans and exit:
//!
//! ```sh
//! cargo run -p headcount-server --bin server -- --seed
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use headcount_api::ApiState;
use headcount_server::{ServerConfig, seed};
use headcount_store_sqlite::SqliteStore;
use rand::{SeedableRng, rngs::StdRng};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Headcount occupancy server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Record a few demo scans into the store and exit.
  #[arg(long)]
  seed: bool,
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
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("HEADCOUNT").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: seed demo data and exit.
  if cli.seed {
    let mut rng = StdRng::from_os_rng();
    seed::seed_demo(&store, &mut rng)
      .await
      .context("failed to seed demo scans")?;
    return Ok(());
  }

  // Build application state.
  let state = ApiState::new(Arc::new(store), server_cfg.capacity, &server_cfg.simulation)
    .context("invalid simulation settings")?;

  let app = headcount_server::router(state);
  let address = server_cfg.address();

  tracing::info!(capacity = server_cfg.capacity.get(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
