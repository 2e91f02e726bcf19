//! HTTP server wiring for Headcount.
//!
//! Loads [`ServerConfig`], mounts the JSON API under `/api`, and provides the
//! demo-data [`seed`] helper used by `server --seed`.

pub mod seed;

use std::path::PathBuf;

use axum::Router;
use headcount_api::{ApiState, SimulationConfig, api_router};
use headcount_core::{occupancy::Capacity, store::EventLog};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `HEADCOUNT_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Rejected at load time if zero.
  #[serde(default)]
  pub capacity:   Capacity,
  #[serde(default)]
  pub simulation: SimulationConfig,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 5000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/headcount/events.db") }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level axum [`Router`]: the API under `/api`, with request
/// tracing.
pub fn router<S>(state: ApiState<S>) -> Router
where
  S: EventLog + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use headcount_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn load(toml: &str) -> Result<ServerConfig, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()?
      .try_deserialize()
  }

  #[test]
  fn config_defaults_fill_gaps() {
    let cfg = load("port = 8080").unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.capacity.get(), 100);
    assert_eq!(cfg.simulation.pool_size, 20);
    assert_eq!(cfg.simulation.max_batch, 100);
    assert_eq!(cfg.simulation.seed, None);
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn config_reads_simulation_section() {
    let cfg = load(
      "capacity = 40\n[simulation]\npool_size = 5\nmax_batch = 10\nseed = 42\n",
    )
    .unwrap();
    assert_eq!(cfg.capacity.get(), 40);
    assert_eq!(cfg.simulation.pool_size, 5);
    assert_eq!(cfg.simulation.max_batch, 10);
    assert_eq!(cfg.simulation.seed, Some(42));
  }

  #[test]
  fn zero_capacity_fails_to_load() {
    assert!(load("capacity = 0").is_err());
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state =
      ApiState::new(Arc::new(store), Capacity::default(), &SimulationConfig::default()).unwrap();

    let resp = router(state.clone())
      .oneshot(Request::get("/api/occupancy").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "low");

    let resp = router(state)
      .oneshot(Request::get("/occupancy").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
