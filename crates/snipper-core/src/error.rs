//! Error types for `snipper-core`.
//!
//! The variants form the small taxonomy every service operation reports in.
//! Transport layers map them onto status codes; the core never decides how
//! an error is rendered.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::store::{StoreError, StoreErrorKind};

/// Field name → first validation message for that field.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum Error {
  /// The entity does not exist, or exists but is hidden from this caller.
  #[error("{0}")]
  NotFound(String),

  /// The caller is known but the visibility rules reject the read.
  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  Unauthenticated(String),

  /// A uniqueness constraint (username, email) would be violated.
  #[error("{0}")]
  Conflict(String),

  #[error("validation failed on {} field(s)", .0.len())]
  Validation(FieldErrors),

  /// A well-formed request carried an argument the store cannot honour,
  /// e.g. an unknown sort field.
  #[error("{0}")]
  InvalidArgument(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The password hasher failed to produce a hash.
  #[error("password hashing failed: {0}")]
  Hashing(String),
}

impl Error {
  /// Classify a backend error. Constraint races that slipped past the
  /// service's own pre-checks still surface as [`Error::Conflict`].
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.kind() {
      StoreErrorKind::Conflict => Self::Conflict(err.to_string()),
      StoreErrorKind::InvalidArgument => Self::InvalidArgument(err.to_string()),
      StoreErrorKind::Other => Self::Store(Box::new(err)),
    }
  }

  pub fn field(field: &str, message: &str) -> Self {
    Self::Validation(FieldErrors::from([(field.to_owned(), message.to_owned())]))
  }
}

impl From<validator::ValidationErrors> for Error {
  fn from(errors: validator::ValidationErrors) -> Self {
    let fields = errors
      .field_errors()
      .into_iter()
      .filter_map(|(field, errs)| {
        let first = errs.first()?;
        let message = first
          .message
          .as_ref()
          .map(|m| m.to_string())
          .unwrap_or_else(|| first.code.to_string());
        Some((field.to_string(), message))
      })
      .collect();
    Self::Validation(fields)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
