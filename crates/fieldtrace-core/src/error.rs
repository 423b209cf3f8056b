//! Error types for `fieldtrace-core`.

use chrono::{DateTime, Datelike, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Carries the first failed validation rule, worded for the client.
  #[error("{0}")]
  Validation(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fail with `message` unless `ok` holds.
pub(crate) fn ensure(ok: bool, message: &str) -> Result<()> {
  if ok {
    Ok(())
  } else {
    Err(Error::Validation(message.to_owned()))
  }
}

/// Years a stored timestamp can hold; RFC 3339 has four-digit years only.
pub const DATE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Fail with `message` if `date` is set and falls outside [`DATE_YEARS`].
pub(crate) fn ensure_date(date: Option<DateTime<Utc>>, message: &str) -> Result<()> {
  ensure(date.is_none_or(|d| DATE_YEARS.contains(&d.year())), message)
}
