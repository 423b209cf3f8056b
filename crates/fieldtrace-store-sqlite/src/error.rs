//! Error type for `fieldtrace-store-sqlite`.

use fieldtrace_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] fieldtrace_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("batch identifier {0:?} is already in use")]
  DuplicateBatch(String),

  #[error("batch {0} already has a carbon record")]
  DuplicateCarbon(i64),

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    matches!(
      self,
      Error::DuplicateBatch(_) | Error::DuplicateCarbon(_) | Error::UsernameTaken(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
