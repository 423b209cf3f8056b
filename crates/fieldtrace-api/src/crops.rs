//! Handler for `POST /farms/:id/crops`.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fieldtrace_core::{farm::NewCrop, store::FarmStore};

use crate::{
  AppState,
  error::ApiError,
  extract::{AppJson, AppPath},
  farms::owned_farm,
  roles::{Authorized, Farmers},
};

/// `POST /farms/:id/crops`: farmer, farm owner only.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Farmers>,
  AppPath(farm_id): AppPath<i64>,
  AppJson(body): AppJson<NewCrop>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  body.validate()?;
  let farm = owned_farm(state.store.as_ref(), farm_id, &auth.user).await?;
  let crop = state
    .store
    .create_crop(farm.id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(crop)))
}
