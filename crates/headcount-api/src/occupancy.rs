//! Handlers for `/occupancy` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/occupancy` | [`OccupancyState`] over today's window |
//! | `GET`  | `/occupancy/timeline` | occupancy after each of today's events |

use axum::{Json, extract::State};
use headcount_core::{
  event::EventWindow,
  occupancy::{self, OccupancyPoint, OccupancyState},
  store::EventLog,
};

use crate::{ApiState, error::ApiError};

/// `GET /occupancy`
pub async fn current<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<OccupancyState>, ApiError>
where
  S: EventLog,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let events = state
    .store
    .list_events(EventWindow::today())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(occupancy::reduce(&events, state.capacity)))
}

/// `GET /occupancy/timeline`
pub async fn timeline<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<OccupancyPoint>>, ApiError>
where
  S: EventLog,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let events = state
    .store
    .list_events(EventWindow::today())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(occupancy::timeline(&events)))
}
