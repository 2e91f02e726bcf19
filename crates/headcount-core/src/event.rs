//! Scan events, the fundamental unit of the occupancy log.
//!
//! An event records that a badge was scanned at the door in one direction.
//! Events are never updated; the log is append-only and every statistic is
//! derived from it on read.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Action ──────────────────────────────────────────────────────────────────

/// The direction of a badge scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanAction {
  In,
  Out,
}

impl ScanAction {
  /// The wire and column representation (`"IN"` / `"OUT"`).
  pub fn as_str(self) -> &'static str {
    match self {
      Self::In => "IN",
      Self::Out => "OUT",
    }
  }
}

impl fmt::Display for ScanAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ScanAction {
  type Err = Error;

  /// Strict: only the exact upper-case spellings are accepted.
  fn from_str(s: &str) -> Result<Self> {
    match s {
      "IN" => Ok(Self::In),
      "OUT" => Ok(Self::Out),
      other => Err(Error::UnknownAction(other.to_owned())),
    }
  }
}

// ─── ScanEvent ───────────────────────────────────────────────────────────────

/// One recorded badge scan. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
  pub id:         Uuid,
  /// Opaque, stable badge identifier (e.g. `USER007`).
  pub subject_id: String,
  pub action:     ScanAction,
  /// Store-assigned; non-decreasing in log order.
  pub timestamp:  DateTime<Utc>,
}

// ─── NewScanEvent ────────────────────────────────────────────────────────────

/// Input to [`crate::store::EventLog::record_scan`].
/// The timestamp is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScanEvent {
  pub subject_id: String,
  pub action:     ScanAction,
}

impl NewScanEvent {
  /// Validating constructor; rejects blank subject ids.
  pub fn new(subject_id: impl Into<String>, action: ScanAction) -> Result<Self> {
    let subject_id = subject_id.into();
    if subject_id.trim().is_empty() {
      return Err(Error::EmptySubjectId);
    }
    Ok(Self { subject_id, action })
  }

  /// Parse an untrusted `(subject, action)` pair, as received from a sensor
  /// or an API client.
  pub fn parse(subject_id: &str, action: &str) -> Result<Self> {
    Self::new(subject_id, action.parse()?)
  }

  pub fn entry(subject_id: impl Into<String>) -> Result<Self> {
    Self::new(subject_id, ScanAction::In)
  }

  pub fn exit(subject_id: impl Into<String>) -> Result<Self> {
    Self::new(subject_id, ScanAction::Out)
  }
}

// ─── Window ──────────────────────────────────────────────────────────────────

/// The bounded time range over which occupancy is derived.
///
/// `since` is inclusive, `until` is exclusive; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventWindow {
  pub since: Option<DateTime<Utc>>,
  pub until: Option<DateTime<Utc>>,
}

impl EventWindow {
  /// The whole log.
  pub fn all() -> Self { Self::default() }

  /// From local midnight onwards.
  pub fn today() -> Self { Self::day_of(Local::now()) }

  /// From midnight of `now`'s calendar day (in `now`'s zone) onwards.
  pub fn day_of<Tz: TimeZone>(now: DateTime<Tz>) -> Self {
    let tz = now.timezone();
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    // Zones that skip midnight on a DST switch start the day an hour later.
    let start = tz
      .from_local_datetime(&midnight)
      .earliest()
      .or_else(|| tz.from_local_datetime(&(midnight + TimeDelta::hours(1))).earliest());

    Self {
      since: start.map(|dt| dt.with_timezone(&Utc)),
      until: None,
    }
  }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.since.is_none_or(|s| at >= s) && self.until.is_none_or(|u| at < u)
  }
}
