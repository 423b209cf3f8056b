//! Extractors that turn axum's plain-text rejections into [`ApiError`]s so
//! clients always receive structured JSON.

use axum::{
  Json,
  extract::{
    FromRequest, FromRequestParts, Path, Request,
    rejection::{JsonRejection, PathRejection},
  },
  http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// A `Json<T>` wrapper whose rejection is a 400 [`ApiError::BadRequest`].
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
  Json<T>: FromRequest<S, Rejection = JsonRejection>,
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(AppJson(value))
  }
}

/// A `Path<T>` wrapper whose rejection is a 400 [`ApiError::BadRequest`].
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
  T: DeserializeOwned + Send,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Path(value) = Path::<T>::from_request_parts(parts, state)
      .await
      .map_err(|e: PathRejection| ApiError::BadRequest(e.body_text()))?;
    Ok(AppPath(value))
  }
}
