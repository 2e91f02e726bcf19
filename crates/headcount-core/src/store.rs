//! The `EventLog` trait.
//!
//! The trait is implemented by storage backends (e.g.
//! `headcount-store-sqlite`). Higher layers (`headcount-api`, the simulator)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::event::{EventWindow, NewScanEvent, ScanEvent};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an append-only scan-event log.
///
/// Events are never updated or deleted. All methods return `Send` futures so
/// the trait can be used in multi-threaded async runtimes (e.g. tokio with
/// `axum`).
pub trait EventLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Append a scan and return the persisted [`ScanEvent`].
  /// The timestamp is assigned by the store at insert time.
  fn record_scan(
    &self,
    input: NewScanEvent,
  ) -> impl Future<Output = Result<ScanEvent, Self::Error>> + Send + '_;

  /// Append a scan with a caller-supplied timestamp.
  ///
  /// Used for backfilling and demo seeding; live traffic goes through
  /// [`record_scan`](Self::record_scan).
  fn record_scan_at(
    &self,
    input: NewScanEvent,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<ScanEvent, Self::Error>> + Send + '_;

  /// All events inside `window`, ascending by timestamp. Events sharing a
  /// timestamp come back in insertion order.
  fn list_events(
    &self,
    window: EventWindow,
  ) -> impl Future<Output = Result<Vec<ScanEvent>, Self::Error>> + Send + '_;
}
