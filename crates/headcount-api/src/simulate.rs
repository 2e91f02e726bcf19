//! Demo-traffic endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rfid-logs/simulate` | `?count=N`; generates and persists N scans |
//! | `GET`  | `/rfid` | one random scan, not persisted |

use axum::{
  Json,
  extract::{Query, State},
};
use headcount_core::{
  event::{EventWindow, NewScanEvent},
  simulate::SimulationBatch,
  store::EventLog,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct BatchParams {
  /// Kept as text and read leniently; see [`BatchParams::count`].
  pub count: Option<String>,
}

impl BatchParams {
  /// The leading run of digits (after optional whitespace and `+`), so
  /// `"10abc"` is 10 and `"5.7"` is 5. Missing, non-numeric, negative or zero
  /// input means a single event. Digit runs too large for `u32` saturate and
  /// are then caught by the batch limit.
  pub fn count(&self) -> u32 {
    let Some(raw) = self.count.as_deref() else { return 1 };
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let digits = raw.find(|c: char| !c.is_ascii_digit()).map_or(raw, |end| &raw[..end]);
    if digits.is_empty() {
      return 1;
    }
    match digits.parse::<u32>() {
      Ok(0) => 1,
      Ok(n) => n,
      Err(_) => u32::MAX,
    }
  }
}

/// `GET /rfid-logs/simulate[?count=N]`
pub async fn batch<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<BatchParams>,
) -> Result<Json<SimulationBatch>, ApiError>
where
  S: EventLog,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let count = params.count();
  if count > state.max_batch {
    return Err(ApiError::BadRequest(format!(
      "count {count} exceeds the batch limit of {}",
      state.max_batch
    )));
  }

  let mut simulator = state.simulator.lock().await;
  let batch = simulator
    .run_batch(state.store.as_ref(), EventWindow::today(), count)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(batch))
}

/// `GET /rfid`
pub async fn mock<S>(State(state): State<ApiState<S>>) -> Json<NewScanEvent> {
  Json(state.simulator.lock().await.mock_scan())
}
