//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings
//! (`2024-05-01T09:30:00.000000Z`) so that lexicographic order in SQL equals
//! chronological order. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use headcount_core::event::{ScanAction, ScanEvent};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── ScanAction ───────────────────────────────────────────────────────────────

pub fn encode_action(a: ScanAction) -> &'static str { a.as_str() }

/// Rows with anything but `IN` / `OUT` are rejected here, before they can
/// reach the reducer.
pub fn decode_action(s: &str) -> Result<ScanAction> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `scan_events` row.
pub struct RawScanEvent {
  pub event_id:    String,
  pub subject_id:  String,
  pub action:      String,
  pub recorded_at: String,
}

impl RawScanEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:    row.get(0)?,
      subject_id:  row.get(1)?,
      action:      row.get(2)?,
      recorded_at: row.get(3)?,
    })
  }

  pub fn into_event(self) -> Result<ScanEvent> {
    Ok(ScanEvent {
      id:         decode_uuid(&self.event_id)?,
      subject_id: self.subject_id,
      action:     decode_action(&self.action)?,
      timestamp:  decode_dt(&self.recorded_at)?,
    })
  }
}
