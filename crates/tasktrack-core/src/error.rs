//! Error types for `tasktrack-core`.
//!
//! Every manager operation returns one of these tags; the HTTP boundary maps
//! each tag to a response status.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Bearer credential missing, malformed, or rejected by the identity
  /// provider.
  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid input: {0}")]
  Validation(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
