//! [`SqliteStore`]: the SQLite implementation of [`EventLog`].

use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use headcount_core::{
  event::{EventWindow, NewScanEvent, ScanEvent},
  store::EventLog,
};

use crate::{
  Error, Result,
  encode::{RawScanEvent, encode_action, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Headcount event log backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Total number of events ever recorded.
  pub async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM scan_events", [], |r| r.get(0))?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }

  /// Insert a fully-built [`ScanEvent`] into the `scan_events` table.
  async fn insert_event(&self, event: &ScanEvent) -> Result<()> {
    let event_id_str    = encode_uuid(event.id);
    let subject_id      = event.subject_id.clone();
    let action_str      = encode_action(event.action);
    let recorded_at_str = encode_dt(event.timestamp);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO scan_events (event_id, subject_id, action, recorded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![event_id_str, subject_id, action_str, recorded_at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── EventLog impl ───────────────────────────────────────────────────────────

impl EventLog for SqliteStore {
  type Error = Error;

  async fn record_scan(&self, input: NewScanEvent) -> Result<ScanEvent> {
    self.record_scan_at(input, Utc::now()).await
  }

  async fn record_scan_at(
    &self,
    input: NewScanEvent,
    at:    DateTime<Utc>,
  ) -> Result<ScanEvent> {
    // Stored at microsecond precision; the returned event must match the row.
    let event = ScanEvent {
      id:         Uuid::new_v4(),
      subject_id: input.subject_id,
      action:     input.action,
      timestamp:  at.trunc_subsecs(6),
    };

    self.insert_event(&event).await?;
    Ok(event)
  }

  async fn list_events(&self, window: EventWindow) -> Result<Vec<ScanEvent>> {
    let since_str = window.since.map(encode_dt);
    let until_str = window.until.map(encode_dt);

    let raws: Vec<RawScanEvent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, subject_id, action, recorded_at
           FROM scan_events
           WHERE (?1 IS NULL OR recorded_at >= ?1)
             AND (?2 IS NULL OR recorded_at <  ?2)
           ORDER BY recorded_at, seq",
        )?;

        let rows = stmt
          .query_map(
            rusqlite::params![since_str, until_str],
            RawScanEvent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawScanEvent::into_event).collect()
  }
}
