//! Error type for `snipper-store-sqlite`.

use snipper_core::store::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that does not map back onto a domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("unsupported sort field: {0:?}")]
  InvalidSortField(String),
}

impl Error {
  fn is_unique_violation(&self) -> bool {
    matches!(
      self,
      Self::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _)
      )) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
  }
}

impl StoreError for Error {
  fn kind(&self) -> StoreErrorKind {
    if self.is_unique_violation() {
      return StoreErrorKind::Conflict;
    }
    match self {
      Self::InvalidSortField(_) => StoreErrorKind::InvalidArgument,
      _ => StoreErrorKind::Other,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
