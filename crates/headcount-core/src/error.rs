//! Error types for `headcount-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown scan action: {0:?}")]
  UnknownAction(String),

  #[error("subject id must not be empty")]
  EmptySubjectId,

  #[error("capacity must be at least 1, got {0}")]
  InvalidCapacity(u32),

  #[error("identifier pool must hold at least one badge")]
  EmptyPool,

  #[error("probability out of range [0, 1]: {0}")]
  InvalidProbability(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
