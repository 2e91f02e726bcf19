//! Occupancy derivation.
//!
//! Occupancy is never stored. Every read replays the event window through an
//! [`OccupancyTracker`] and materialises an [`OccupancyState`] from it.
//!
//! Per-subject transitions are idempotent: an IN for a subject already inside
//! and an OUT for a subject not inside leave occupancy untouched, while the
//! raw `total_in` / `total_out` counters still count them.

use std::{collections::BTreeMap, num::NonZeroU32};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  event::{ScanAction, ScanEvent},
};

// ─── Capacity ────────────────────────────────────────────────────────────────

/// The configured number of people the space is meant to hold.
///
/// Zero is unrepresentable, so percentage computation never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Capacity(NonZeroU32);

impl Capacity {
  pub fn new(value: u32) -> Result<Self> {
    NonZeroU32::new(value)
      .map(Self)
      .ok_or(Error::InvalidCapacity(value))
  }

  pub fn get(self) -> u32 { self.0.get() }

  /// `current` as a rounded share of capacity; not clamped at 100.
  pub fn percentage_of(self, current: u32) -> u32 {
    (f64::from(current) / f64::from(self.get()) * 100.0).round() as u32
  }

  /// `self * factor`, for comparing head counts against fractional bands.
  pub(crate) fn scaled(self, factor: f64) -> f64 { f64::from(self.get()) * factor }
}

impl Default for Capacity {
  fn default() -> Self { Self(NonZeroU32::new(100).unwrap_or(NonZeroU32::MIN)) }
}

impl TryFrom<u32> for Capacity {
  type Error = Error;

  fn try_from(value: u32) -> Result<Self> { Self::new(value) }
}

impl Serialize for Capacity {
  fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u32(self.get())
  }
}

impl<'de> Deserialize<'de> for Capacity {
  fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = u32::deserialize(d)?;
    Self::new(raw).map_err(serde::de::Error::custom)
  }
}

// ─── Status band ─────────────────────────────────────────────────────────────

/// Coarse load classification. Bands are `[0,30)`, `[30,70)`, `[70,∞)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Low,
  Medium,
  High,
}

impl Status {
  pub const MEDIUM_FROM: u32 = 30;
  pub const HIGH_FROM: u32 = 70;

  pub fn from_percentage(percentage: u32) -> Self {
    if percentage >= Self::HIGH_FROM {
      Self::High
    } else if percentage >= Self::MEDIUM_FROM {
      Self::Medium
    } else {
      Self::Low
    }
  }
}

// ─── Materialised state ──────────────────────────────────────────────────────

/// The computed read model for an event window. Never stored, always
/// derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccupancyState {
  pub current:      u32,
  pub total_in:     u32,
  pub total_out:    u32,
  pub peak:         u32,
  pub capacity:     Capacity,
  pub percentage:   u32,
  pub status:       Status,
  /// Wall-clock time of computation, unrelated to any event timestamp.
  pub last_updated: DateTime<Utc>,
}

/// Occupancy immediately after one event, for trend charts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyPoint {
  pub timestamp: DateTime<Utc>,
  pub occupancy: u32,
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Single-pass accumulator over an ordered event stream.
///
/// Feeding a whole window through [`apply`](Self::apply) and calling
/// [`finish`](Self::finish) is exactly the full-replay reduction.
#[derive(Debug, Clone, Default)]
pub struct OccupancyTracker {
  /// Last effective action per subject; absent means "not tracked" (≡ OUT).
  presence:  BTreeMap<String, ScanAction>,
  current:   u32,
  peak:      u32,
  total_in:  u32,
  total_out: u32,
}

impl OccupancyTracker {
  pub fn new() -> Self { Self::default() }

  /// Fold one event in. Returns `true` if it changed occupancy.
  pub fn apply(&mut self, subject_id: &str, action: ScanAction) -> bool {
    match action {
      ScanAction::In => {
        self.total_in += 1;
        if self.is_inside(subject_id) {
          return false;
        }
        self.presence.insert(subject_id.to_owned(), ScanAction::In);
        self.current += 1;
        self.peak = self.peak.max(self.current);
        true
      }
      ScanAction::Out => {
        self.total_out += 1;
        if !self.is_inside(subject_id) {
          return false;
        }
        self.presence.insert(subject_id.to_owned(), ScanAction::Out);
        self.current -= 1;
        true
      }
    }
  }

  pub fn apply_event(&mut self, event: &ScanEvent) -> bool {
    self.apply(&event.subject_id, event.action)
  }

  pub fn is_inside(&self, subject_id: &str) -> bool {
    self.presence.get(subject_id) == Some(&ScanAction::In)
  }

  /// Running head count maintained by [`apply`](Self::apply).
  pub fn current(&self) -> u32 { self.current }

  pub fn peak(&self) -> u32 { self.peak }

  /// Subjects currently inside, in identifier order.
  pub fn inside(&self) -> Vec<&str> {
    self
      .presence
      .iter()
      .filter(|(_, action)| **action == ScanAction::In)
      .map(|(id, _)| id.as_str())
      .collect()
  }

  /// Head count recomputed from the presence map.
  pub fn count_inside(&self) -> u32 {
    self.presence.values().filter(|a| **a == ScanAction::In).count() as u32
  }

  /// Materialise the state with `now` as `last_updated`.
  pub fn finish(&self, capacity: Capacity, now: DateTime<Utc>) -> OccupancyState {
    let current = self.count_inside();
    debug_assert_eq!(current, self.current, "running count diverged from presence map");

    let percentage = capacity.percentage_of(current);
    OccupancyState {
      current,
      total_in: self.total_in,
      total_out: self.total_out,
      peak: self.peak,
      capacity,
      percentage,
      status: Status::from_percentage(percentage),
      last_updated: now,
    }
  }
}

// ─── Entry points ────────────────────────────────────────────────────────────

/// Replay `events` (ascending by timestamp) into a tracker.
pub fn track<'a>(events: impl IntoIterator<Item = &'a ScanEvent>) -> OccupancyTracker {
  let mut tracker = OccupancyTracker::new();
  for event in events {
    tracker.apply_event(event);
  }
  tracker
}

/// Derive occupancy for a window, stamped with the current wall-clock time.
pub fn reduce(events: &[ScanEvent], capacity: Capacity) -> OccupancyState {
  reduce_at(events, capacity, Utc::now())
}

/// [`reduce`] with an explicit computation time.
pub fn reduce_at(
  events: &[ScanEvent],
  capacity: Capacity,
  now: DateTime<Utc>,
) -> OccupancyState {
  track(events).finish(capacity, now)
}

/// Occupancy after each event of the window, in log order.
pub fn timeline(events: &[ScanEvent]) -> Vec<OccupancyPoint> {
  let mut tracker = OccupancyTracker::new();
  events
    .iter()
    .map(|event| {
      tracker.apply_event(event);
      OccupancyPoint { timestamp: event.timestamp, occupancy: tracker.current() }
    })
    .collect()
}
