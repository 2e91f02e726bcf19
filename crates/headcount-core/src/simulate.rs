//! Demo-traffic generator.
//!
//! The simulator produces one synthetic scan at a time, biased by the current
//! occupancy so the series drifts around mid-range instead of running away:
//!
//! | occupancy                    | decision                                |
//! |------------------------------|-----------------------------------------|
//! | empty                        | a fresh badge enters                    |
//! | `>= exit_threshold` of capacity | someone inside leaves                |
//! | below `low_threshold`        | enter with `low_entry_probability`      |
//! | otherwise                    | enter with `entry_probability`          |
//!
//! Whenever an exit is chosen but nobody is tracked as inside, a fresh badge
//! enters instead. Randomness is injected, so a seeded generator replays the
//! exact same sequence.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  event::{EventWindow, NewScanEvent, ScanAction, ScanEvent},
  occupancy::{self, Capacity, OccupancyState},
  store::EventLog,
};

// ─── Policy ──────────────────────────────────────────────────────────────────

/// Tunables for the decision policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationPolicy {
  /// Fresh badges are drawn from `USER001..=USER{pool_size}`.
  pub pool_size:             u32,
  /// Share of capacity at and above which someone is forced out.
  pub exit_threshold:        f64,
  /// Share of capacity below which entries are favoured more strongly.
  pub low_threshold:         f64,
  pub low_entry_probability: f64,
  pub entry_probability:     f64,
}

impl Default for SimulationPolicy {
  fn default() -> Self {
    Self {
      pool_size:             20,
      exit_threshold:        0.9,
      low_threshold:         0.3,
      low_entry_probability: 0.7,
      entry_probability:     0.6,
    }
  }
}

impl SimulationPolicy {
  /// Reject configurations the generator cannot honour.
  pub fn validate(&self) -> Result<()> {
    if self.pool_size == 0 {
      return Err(Error::EmptyPool);
    }
    for p in [
      self.exit_threshold,
      self.low_threshold,
      self.low_entry_probability,
      self.entry_probability,
    ] {
      if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidProbability(p));
      }
    }
    Ok(())
  }

  /// A badge drawn uniformly from the identifier pool.
  pub fn fresh_badge<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
    badge(rng.random_range(1..=self.pool_size.max(1)))
  }

  /// Pick the next event given the derived `state` and who is inside.
  pub fn decide<R: Rng + ?Sized>(
    &self,
    state: &OccupancyState,
    inside: &[&str],
    rng: &mut R,
  ) -> NewScanEvent {
    let current = f64::from(state.current);

    let enter = if state.current == 0 {
      true
    } else if current >= state.capacity.scaled(self.exit_threshold) {
      false
    } else if current < state.capacity.scaled(self.low_threshold) {
      rng.random_bool(self.low_entry_probability)
    } else {
      rng.random_bool(self.entry_probability)
    };

    if !enter && !inside.is_empty() {
      let leaving = inside[rng.random_range(0..inside.len())];
      return NewScanEvent { subject_id: leaving.to_owned(), action: ScanAction::Out };
    }

    NewScanEvent { subject_id: self.fresh_badge(rng), action: ScanAction::In }
  }
}

/// The canonical badge label for pool slot `n` (`USER007`).
pub fn badge(n: u32) -> String { format!("USER{n:03}") }

/// A random scan from the pool, ignoring occupancy. Never persisted; mimics
/// what a raw reader would emit.
pub fn mock_scan<R: Rng + ?Sized>(policy: &SimulationPolicy, rng: &mut R) -> NewScanEvent {
  let subject_id = policy.fresh_badge(rng);
  let action = if rng.random_bool(0.5) { ScanAction::In } else { ScanAction::Out };
  NewScanEvent { subject_id, action }
}

// ─── Batch runner ────────────────────────────────────────────────────────────

/// Result of a simulation batch: what was written and where it left things.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationBatch {
  pub events: Vec<ScanEvent>,
  pub stats:  OccupancyState,
}

/// Stateful generator bound to a capacity and a random source.
#[derive(Debug, Clone)]
pub struct Simulator<R> {
  policy:   SimulationPolicy,
  capacity: Capacity,
  rng:      R,
}

impl<R: Rng + Send> Simulator<R> {
  pub fn new(policy: SimulationPolicy, capacity: Capacity, rng: R) -> Self {
    Self { policy, capacity, rng }
  }

  /// Decide the next event from an already-fetched window.
  pub fn next_event(&mut self, window_events: &[ScanEvent]) -> NewScanEvent {
    let tracker = occupancy::track(window_events);
    let state = tracker.finish(self.capacity, Utc::now());
    self.policy.decide(&state, &tracker.inside(), &mut self.rng)
  }

  /// A raw, unpersisted scan (see [`mock_scan`]).
  pub fn mock_scan(&mut self) -> NewScanEvent { mock_scan(&self.policy, &mut self.rng) }

  /// Generate and persist `count` events, one read–decide–write step at a
  /// time so every decision sees the previous write.
  ///
  /// The first persistence failure aborts the batch. Events written before it
  /// stay in the log.
  pub async fn run_batch<S: EventLog>(
    &mut self,
    store: &S,
    window: EventWindow,
    count: u32,
  ) -> Result<SimulationBatch, S::Error> {
    let mut events = Vec::with_capacity(count as usize);

    for _ in 0..count {
      let log = store.list_events(window).await?;
      let next = self.next_event(&log);

      match store.record_scan(next).await {
        Ok(event) => {
          debug!(subject = %event.subject_id, action = %event.action, "simulated scan");
          events.push(event);
        }
        Err(e) => {
          warn!(persisted = events.len(), requested = count, error = %e, "simulation batch aborted");
          return Err(e);
        }
      }
    }

    let stats = occupancy::reduce(&store.list_events(window).await?, self.capacity);
    info!(generated = events.len(), current = stats.current, "simulation batch complete");
    Ok(SimulationBatch { events, stats })
  }
}
