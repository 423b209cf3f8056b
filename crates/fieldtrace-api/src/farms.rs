//! Handlers for `/farms` endpoints.
//!
//! | Method | Path | Roles | Notes |
//! |--------|------|-------|-------|
//! | `GET`  | `/farms` | farmer, regulator, processor | Caller's own farms |
//! | `POST` | `/farms` | farmer | Body: `{"name","location","size","type"}` |
//! | `GET`  | `/farms/:id` | any | Owner only; includes crops and activities |
//! | `GET`  | `/farms/:id/carbon` | farmer, regulator, processor | Activity-based estimate |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use fieldtrace_core::{
  carbon::{self, CarbonEstimate},
  farm::{Farm, FarmDetails, NewFarm},
  role::User,
  store::FarmStore,
};

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{AppJson, AppPath},
  roles::{Authorized, FarmReaders, Farmers},
};

/// Returned when a farm exists but belongs to someone else.
pub const NOT_OWNER: &str = "Unauthorized";

// ─── Lookup helpers ───────────────────────────────────────────────────────────

/// Load a farm or answer 404.
pub(crate) async fn existing_farm<S: FarmStore>(store: &S, id: i64) -> Result<Farm, ApiError> {
  store
    .get_farm(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("Farm"))
}

/// Load a farm the caller owns: 404 if it is missing, 403 if it is not theirs.
pub(crate) async fn owned_farm<S: FarmStore>(
  store: &S,
  id: i64,
  user: &User,
) -> Result<Farm, ApiError> {
  let farm = existing_farm(store, id).await?;
  if farm.user_id != user.id {
    return Err(ApiError::Forbidden(NOT_OWNER.to_owned()));
  }
  Ok(farm)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /farms`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<FarmReaders>,
) -> Result<Json<Vec<Farm>>, ApiError>
where
  S: FarmStore + 'static,
{
  let farms = state
    .store
    .list_farms_by_user(&auth.user.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(farms))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /farms`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Farmers>,
  AppJson(body): AppJson<NewFarm>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  body.validate()?;
  let farm = state
    .store
    .create_farm(auth.user.id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(farm_id = farm.id, owner = %farm.user_id, "farm created");
  Ok((StatusCode::CREATED, Json(farm)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /farms/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  AppPath(id): AppPath<i64>,
) -> Result<Json<FarmDetails>, ApiError>
where
  S: FarmStore + 'static,
{
  let farm = owned_farm(state.store.as_ref(), id, &user).await?;
  let crops = state
    .store
    .list_crops_by_farm(farm.id)
    .await
    .map_err(ApiError::store)?;
  let activities = state
    .store
    .list_activities_by_farm(farm.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(FarmDetails { farm, crops, activities }))
}

// ─── Carbon estimate ──────────────────────────────────────────────────────────

/// `GET /farms/:id/carbon`
pub async fn carbon<S>(
  State(state): State<AppState<S>>,
  _auth: Authorized<FarmReaders>,
  AppPath(id): AppPath<i64>,
) -> Result<Json<CarbonEstimate>, ApiError>
where
  S: FarmStore + 'static,
{
  let farm = existing_farm(state.store.as_ref(), id).await?;
  let activities = state
    .store
    .list_activities_by_farm(farm.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(carbon::estimate(&activities)))
}
