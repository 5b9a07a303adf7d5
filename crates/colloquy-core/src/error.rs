//! Error types for `colloquy-core`.

use thiserror::Error;

use crate::transport::TransportError;

/// A boxed collaborator error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Raised before any network interaction; never retried.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error(transparent)]
  Transport(#[from] TransportError),

  #[error("encryption error: {0}")]
  Encryption(#[source] BoxError),

  #[error("identity error: {0}")]
  Identity(#[source] BoxError),

  #[error("normalizer error: {0}")]
  Normalize(#[source] BoxError),

  #[error("key management service issued no key")]
  MissingKey,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }

  pub fn encryption(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Encryption(Box::new(e))
  }

  pub fn identity(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Identity(Box::new(e))
  }

  pub fn normalize(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Normalize(Box::new(e))
  }

  pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }

  /// Whether the backend reported the addressed resource as absent.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::Transport(e) if e.is_not_found())
  }

  /// The backend status code, when the failure came from the backend.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Transport(e) => e.status,
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn not_found_is_only_reported_for_404_transport_failures() {
    let missing = Error::from(TransportError::with_status(404, "no such conversation"));
    assert!(missing.is_not_found());
    assert_eq!(missing.status(), Some(404));

    let conflict = Error::from(TransportError::with_status(409, "conflict"));
    assert!(!conflict.is_not_found());

    let invalid = Error::validation("`participants` is required");
    assert!(!invalid.is_not_found());
    assert!(invalid.is_validation());
    assert_eq!(invalid.status(), None);
  }
}
