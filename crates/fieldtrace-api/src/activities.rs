//! Handlers for a farm's append-only activity log.
//!
//! | Method | Path | Roles |
//! |--------|------|-------|
//! | `GET`  | `/farms/:id/activities` | farmer, regulator, processor |
//! | `POST` | `/farms/:id/activities` | farmer (owner) |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fieldtrace_core::{
  farm::{Activity, NewActivity},
  store::FarmStore,
};

use crate::{
  AppState,
  error::ApiError,
  extract::{AppJson, AppPath},
  farms::owned_farm,
  roles::{Authorized, FarmReaders, Farmers},
};

/// `GET /farms/:id/activities`: newest first. An unknown farm yields `[]`.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authorized<FarmReaders>,
  AppPath(farm_id): AppPath<i64>,
) -> Result<Json<Vec<Activity>>, ApiError>
where
  S: FarmStore + 'static,
{
  let activities = state
    .store
    .list_activities_by_farm(farm_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(activities))
}

/// `POST /farms/:id/activities`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Farmers>,
  AppPath(farm_id): AppPath<i64>,
  AppJson(body): AppJson<NewActivity>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  body.validate()?;
  let farm = owned_farm(state.store.as_ref(), farm_id, &auth.user).await?;
  let activity = state
    .store
    .create_activity(farm.id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(activity)))
}
