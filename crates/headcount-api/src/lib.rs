//! JSON REST API for Headcount.
//!
//! Exposes an axum [`Router`] backed by any [`headcount_core::store::EventLog`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", headcount_api::api_router(state))
//! ```

pub mod error;
pub mod occupancy;
pub mod scans;
pub mod simulate;

use std::sync::Arc;

use axum::{Router, routing::get};
use headcount_core::{
  occupancy::Capacity,
  simulate::{SimulationPolicy, Simulator},
  store::EventLog,
};
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;
use tokio::sync::Mutex;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// The `[simulation]` configuration section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
  /// Size of the demo badge pool (`USER001..`).
  pub pool_size: u32,
  /// Largest `count` a single simulate request may ask for.
  pub max_batch: u32,
  /// Fixes the random stream; `None` seeds from the OS.
  pub seed:      Option<u64>,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      pool_size: SimulationPolicy::default().pool_size,
      max_batch: 100,
      seed:      None,
    }
  }
}

impl SimulationConfig {
  pub fn policy(&self) -> SimulationPolicy {
    SimulationPolicy { pool_size: self.pool_size, ..SimulationPolicy::default() }
  }
}

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through all API handlers.
#[derive(Clone)]
pub struct ApiState<S> {
  pub store:     Arc<S>,
  pub capacity:  Capacity,
  pub max_batch: u32,
  /// One generator for the whole process; batches hold the lock while they
  /// run, so a seeded stream replays deterministically.
  pub simulator: Arc<Mutex<Simulator<StdRng>>>,
}

impl<S> ApiState<S> {
  /// Validates the simulation settings before building the state.
  pub fn new(
    store: Arc<S>,
    capacity: Capacity,
    simulation: &SimulationConfig,
  ) -> Result<Self, headcount_core::Error> {
    let policy = simulation.policy();
    policy.validate()?;

    let rng = match simulation.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_os_rng(),
    };

    Ok(Self {
      store,
      capacity,
      max_batch: simulation.max_batch.max(1),
      simulator: Arc::new(Mutex::new(Simulator::new(policy, capacity, rng))),
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: EventLog + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Occupancy
    .route("/occupancy", get(occupancy::current::<S>))
    .route("/occupancy/timeline", get(occupancy::timeline::<S>))
    // Scan log
    .route("/rfid-logs", get(scans::list::<S>).post(scans::create::<S>))
    .route("/rfid-logs/simulate", get(simulate::batch::<S>))
    // Raw reader mock
    .route("/rfid", get(simulate::mock::<S>))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::{TimeDelta, Utc};
  use headcount_core::{
    event::{EventWindow, NewScanEvent, ScanAction},
    store::EventLog,
  };
  use headcount_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state(capacity: u32, seed: u64) -> ApiState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let sim = SimulationConfig { seed: Some(seed), max_batch: 50, ..SimulationConfig::default() };
    ApiState::new(Arc::new(store), Capacity::new(capacity).unwrap(), &sim).unwrap()
  }

  async fn call(
    state:  ApiState<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<&str>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder
      .body(Body::from(body.unwrap_or_default().to_owned()))
      .unwrap();
    let resp = api_router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, json)
  }

  async fn scan(state: &ApiState<SqliteStore>, subject: &str, action: ScanAction) {
    state
      .store
      .record_scan(NewScanEvent::new(subject, action).unwrap())
      .await
      .unwrap();
  }

  // ── Occupancy ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn occupancy_of_empty_log() {
    let state = make_state(100, 1).await;
    let (status, json) = call(state, "GET", "/occupancy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current"], 0);
    assert_eq!(json["totalIn"], 0);
    assert_eq!(json["totalOut"], 0);
    assert_eq!(json["peak"], 0);
    assert_eq!(json["capacity"], 100);
    assert_eq!(json["percentage"], 0);
    assert_eq!(json["status"], "low");
    assert!(json["lastUpdated"].is_string());
  }

  #[tokio::test]
  async fn occupancy_reflects_todays_scans() {
    let state = make_state(100, 1).await;
    scan(&state, "A", ScanAction::In).await;
    scan(&state, "B", ScanAction::In).await;
    scan(&state, "A", ScanAction::Out).await;
    scan(&state, "C", ScanAction::In).await;

    let (_, json) = call(state, "GET", "/occupancy", None).await;
    assert_eq!(json["totalIn"], 3);
    assert_eq!(json["totalOut"], 1);
    assert_eq!(json["current"], 2);
    assert_eq!(json["peak"], 2);
    assert_eq!(json["percentage"], 2);
  }

  #[tokio::test]
  async fn occupancy_ignores_earlier_days() {
    let state = make_state(100, 1).await;
    let two_days_ago = Utc::now() - TimeDelta::days(2);
    state
      .store
      .record_scan_at(NewScanEvent::entry("OLD").unwrap(), two_days_ago)
      .await
      .unwrap();

    let (_, json) = call(state.clone(), "GET", "/occupancy", None).await;
    assert_eq!(json["current"], 0);

    let (_, all) = call(state, "GET", "/rfid-logs?all=true", None).await;
    assert_eq!(all.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn timeline_has_one_point_per_event() {
    let state = make_state(100, 1).await;
    scan(&state, "A", ScanAction::In).await;
    scan(&state, "A", ScanAction::In).await;
    scan(&state, "B", ScanAction::In).await;

    let (status, json) = call(state, "GET", "/occupancy/timeline", None).await;
    assert_eq!(status, StatusCode::OK);
    let occupancy: Vec<u64> = json
      .as_array()
      .unwrap()
      .iter()
      .map(|p| p["occupancy"].as_u64().unwrap())
      .collect();
    assert_eq!(occupancy, vec![1, 1, 2]);
  }

  // ── Scan log ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn post_scan_returns_201_and_lists_it() {
    let state = make_state(100, 1).await;
    let (status, json) = call(
      state.clone(),
      "POST",
      "/rfid-logs",
      Some(r#"{"subjectId":"USER004","action":"IN"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["subjectId"], "USER004");
    assert_eq!(json["action"], "IN");
    assert!(json["id"].is_string());
    assert!(json["timestamp"].is_string());

    let (status, list) = call(state, "GET", "/rfid-logs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0], json, "listed scan is exactly the one returned");
  }

  #[tokio::test]
  async fn simulated_events_match_the_log() {
    let state = make_state(100, 5).await;
    let (_, batch) = call(state.clone(), "GET", "/rfid-logs/simulate?count=10", None).await;
    let (_, list) = call(state, "GET", "/rfid-logs", None).await;
    assert_eq!(batch["events"], list);
  }

  #[tokio::test]
  async fn post_scan_accepts_user_id_alias() {
    let state = make_state(100, 1).await;
    let (status, json) = call(
      state,
      "POST",
      "/rfid-logs",
      Some(r#"{"userId":"USER009","action":"OUT"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["subjectId"], "USER009");
  }

  #[tokio::test]
  async fn malformed_scans_are_rejected_with_400() {
    for body in [
      r#"{"subjectId":"USER001","action":"SIDEWAYS"}"#,
      r#"{"subjectId":"USER001","action":"in"}"#,
      r#"{"subjectId":"   ","action":"IN"}"#,
      r#"{"action":"IN"}"#,
      r#"not json"#,
    ] {
      let state = make_state(100, 1).await;
      let (status, json) = call(state.clone(), "POST", "/rfid-logs", Some(body)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
      assert!(json["error"].is_string());
      assert!(state.store.list_events(EventWindow::all()).await.unwrap().is_empty());
    }
  }

  // ── Simulation ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn simulate_defaults_to_one_entry() {
    let state = make_state(100, 1).await;
    let (status, json) = call(state, "GET", "/rfid-logs/simulate", None).await;
    assert_eq!(status, StatusCode::OK);
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["action"], "IN");
    assert_eq!(json["stats"]["current"], 1);
  }

  #[tokio::test]
  async fn simulate_count_is_lenient_but_bounded() {
    let state = make_state(100, 2).await;
    let cases = [("count=5", 5), ("count=3abc", 3), ("count=0", 1), ("count=abc", 1)];
    for (query, expected) in cases {
      let (status, json) =
        call(state.clone(), "GET", &format!("/rfid-logs/simulate?{query}"), None).await;
      assert_eq!(status, StatusCode::OK, "{query}");
      assert_eq!(json["events"].as_array().unwrap().len(), expected, "{query}");
    }

    let (status, _) = call(state, "GET", "/rfid-logs/simulate?count=51", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn simulate_near_capacity_sends_someone_out() {
    let state = make_state(10, 3).await;
    for id in ["A", "B", "C", "D", "E", "F", "G", "H", "I"] {
      scan(&state, id, ScanAction::In).await;
    }
    let (_, json) = call(state, "GET", "/rfid-logs/simulate", None).await;
    let ev = &json["events"][0];
    assert_eq!(ev["action"], "OUT");
    assert!(["A", "B", "C", "D", "E", "F", "G", "H", "I"]
      .contains(&ev["subjectId"].as_str().unwrap()));
    assert_eq!(json["stats"]["current"], 8);
  }

  #[tokio::test]
  async fn seeded_state_replays_the_same_batch() {
    let pairs = |json: &Value| {
      json["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["subjectId"].clone(), e["action"].clone()))
        .collect::<Vec<_>>()
    };
    let (_, a) = call(make_state(100, 77).await, "GET", "/rfid-logs/simulate?count=20", None).await;
    let (_, b) = call(make_state(100, 77).await, "GET", "/rfid-logs/simulate?count=20", None).await;
    assert_eq!(pairs(&a), pairs(&b));
  }

  #[tokio::test]
  async fn mock_reader_does_not_persist() {
    let state = make_state(100, 4).await;
    let (status, json) = call(state.clone(), "GET", "/rfid", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["subjectId"].as_str().unwrap().starts_with("USER"));
    assert!(["IN", "OUT"].contains(&json["action"].as_str().unwrap()));
    assert!(state.store.list_events(EventWindow::all()).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn invalid_pool_is_rejected_at_construction() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let sim = SimulationConfig { pool_size: 0, ..SimulationConfig::default() };
    assert!(ApiState::new(Arc::new(store), Capacity::default(), &sim).is_err());
  }
}
