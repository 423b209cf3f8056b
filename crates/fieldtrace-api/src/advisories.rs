//! Handlers for farm advisories.
//!
//! | Method | Path | Roles |
//! |--------|------|-------|
//! | `GET`  | `/farms/:id/advisories` | farmer, regulator, processor |
//! | `POST` | `/farms/:id/advisories/generate` | farmer (owner) |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fieldtrace_core::{
  farm::{AI_GENERATED, Advisory, NewAdvisory},
  store::FarmStore,
};
use serde_json::json;

use crate::{
  AppState,
  advisor::EMPTY_COMPLETION,
  error::ApiError,
  extract::AppPath,
  farms::owned_farm,
  roles::{Authorized, FarmReaders, Farmers},
};

/// `GET /farms/:id/advisories`: newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _auth: Authorized<FarmReaders>,
  AppPath(farm_id): AppPath<i64>,
) -> Result<Json<Vec<Advisory>>, ApiError>
where
  S: FarmStore + 'static,
{
  let advisories = state
    .store
    .list_advisories_by_farm(farm_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(advisories))
}

/// `POST /farms/:id/advisories/generate`
///
/// Makes one call to the configured [`crate::advisor::Advisor`] and stores
/// the result. Nothing is persisted if the call fails.
pub async fn generate<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Farmers>,
  AppPath(farm_id): AppPath<i64>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  let farm = owned_farm(state.store.as_ref(), farm_id, &auth.user).await?;

  let text = state.advisor.advise(&farm).await?;
  let message = if text.trim().is_empty() {
    EMPTY_COMPLETION.to_owned()
  } else {
    text
  };

  let advisory = state
    .store
    .create_advisory(NewAdvisory {
      farm_id: farm.id,
      kind:    AI_GENERATED.to_owned(),
      message,
      data:    Some(json!({ "generated": true })),
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(advisory)))
}
