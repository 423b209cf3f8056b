//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the server as `{"message": "..."}`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use fieldtrace_core::{store::StoreError, trace::TraceError};
use serde_json::json;
use thiserror::Error;

use crate::advisor::AdvisorError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("advisory generation failed: {0}")]
  Advisory(#[from] AdvisorError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error: uniqueness conflicts become 409, everything
  /// else is an internal error.
  pub fn store<E: StoreError>(e: E) -> Self {
    if e.is_conflict() {
      ApiError::Conflict(e.to_string())
    } else {
      ApiError::Store(Box::new(e))
    }
  }

  pub fn not_found(entity: &str) -> Self { ApiError::NotFound(format!("{entity} not found")) }
}

impl From<fieldtrace_core::Error> for ApiError {
  fn from(e: fieldtrace_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

/// A missing batch is a 404; a batch pointing at a vanished farm or crop is an
/// internal error.
impl<E: StoreError> From<TraceError<E>> for ApiError {
  fn from(e: TraceError<E>) -> Self {
    match e {
      TraceError::BatchNotFound(_) => ApiError::not_found("Batch"),
      TraceError::Store(e) => ApiError::store(e),
      dangling @ TraceError::Dangling { .. } => ApiError::Store(Box::new(dangling)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Advisory(e) => {
        tracing::error!(error = %e, "AI advisory generation failed");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Failed to generate advisory".to_owned(),
        )
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "internal error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          "Internal server error".to_owned(),
        )
      }
    };

    let mut res = (status, Json(json!({ "message": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"fieldtrace\""),
      );
    }
    res
  }
}
