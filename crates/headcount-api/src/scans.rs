//! Handlers for `/rfid-logs` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rfid-logs` | today's events; `?all=true` for the whole log |
//! | `POST` | `/rfid-logs` | Body: [`NewScanBody`]; returns 201 + stored event |

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use headcount_core::{
  event::{EventWindow, NewScanEvent, ScanEvent},
  store::EventLog,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If `true`, return the whole log instead of today's window.
  #[serde(default)]
  pub all: bool,
}

/// `GET /rfid-logs[?all=true]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ScanEvent>>, ApiError>
where
  S: EventLog,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let window = if params.all { EventWindow::all() } else { EventWindow::today() };
  let events = state
    .store
    .list_events(window)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(events))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /rfid-logs`.
///
/// `action` is taken as a plain string and validated here, so a bad value is
/// a 400 rather than a deserialisation rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScanBody {
  #[serde(alias = "userId")]
  pub subject_id: String,
  pub action:     String,
}

impl TryFrom<NewScanBody> for NewScanEvent {
  type Error = headcount_core::Error;

  fn try_from(b: NewScanBody) -> Result<Self, Self::Error> {
    NewScanEvent::parse(&b.subject_id, &b.action)
  }
}

/// `POST /rfid-logs`: returns 201 + the stored [`ScanEvent`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<NewScanBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: EventLog,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let input = NewScanEvent::try_from(body)?;

  let event = state
    .store
    .record_scan(input)
    .await
    .map_err(ApiError::store)?;
  tracing::debug!(subject = %event.subject_id, action = %event.action, "scan recorded");
  Ok((StatusCode::CREATED, Json(event)))
}
