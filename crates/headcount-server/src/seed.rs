//! Demo data for a fresh store.

use headcount_core::{
  event::{NewScanEvent, ScanAction, ScanEvent},
  simulate::badge,
  store::EventLog,
};
use rand::Rng;

/// Badges `USER001..=USER005`.
pub const DEMO_BADGES: u32 = 5;

/// Events written by [`seed_demo`].
pub const DEMO_EVENTS: usize = 10;

/// Record [`DEMO_EVENTS`] scans for randomly picked demo badges, alternating
/// IN and OUT so the room stays roughly balanced.
pub async fn seed_demo<S, R>(store: &S, rng: &mut R) -> Result<Vec<ScanEvent>, S::Error>
where
  S: EventLog,
  R: Rng + Send,
{
  let mut written = Vec::with_capacity(DEMO_EVENTS);
  for i in 0..DEMO_EVENTS {
    let action = if i % 2 == 0 { ScanAction::In } else { ScanAction::Out };
    let input = NewScanEvent {
      subject_id: badge(rng.random_range(1..=DEMO_BADGES)),
      action,
    };
    written.push(store.record_scan(input).await?);
  }
  tracing::info!(events = written.len(), "demo scans recorded");
  Ok(written)
}
