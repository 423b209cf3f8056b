//! Handlers for batches and the public traceability view.
//!
//! | Method | Path | Roles | Notes |
//! |--------|------|-------|-------|
//! | `GET`  | `/traceability/:ident` | public | Composed batch journey |
//! | `POST` | `/farms/:id/batches` | farmer (owner) | 409 on a reused identifier |
//! | `POST` | `/traceability/:ident/events` | farmer, processor, retailer | Timestamp defaults to now |
//! | `POST` | `/traceability/:ident/carbon` | farmer (owner) | 409 if already recorded |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use fieldtrace_core::{
  store::FarmStore,
  trace::{
    self, Batch, NewBatch, NewCarbonRecord, NewTraceabilityEvent, TraceabilityView,
  },
};

use crate::{
  AppState,
  error::ApiError,
  extract::{AppJson, AppPath},
  farms::owned_farm,
  roles::{Authorized, ChainHandlers, Farmers},
};

/// Load a batch by its public identifier or answer 404.
async fn existing_batch<S: FarmStore>(store: &S, ident: &str) -> Result<Batch, ApiError> {
  store
    .get_batch_by_identifier(ident)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found("Batch"))
}

// ─── Public view ──────────────────────────────────────────────────────────────

/// `GET /traceability/:ident`: no authentication.
pub async fn get<S>(
  State(state): State<AppState<S>>,
  AppPath(ident): AppPath<String>,
) -> Result<Json<TraceabilityView>, ApiError>
where
  S: FarmStore + 'static,
{
  let view = trace::assemble(state.store.as_ref(), &ident).await?;
  Ok(Json(view))
}

// ─── Batches ──────────────────────────────────────────────────────────────────

/// `POST /farms/:id/batches`
pub async fn create_batch<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Farmers>,
  AppPath(farm_id): AppPath<i64>,
  AppJson(mut body): AppJson<NewBatch>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  body.validate()?;
  let farm = owned_farm(state.store.as_ref(), farm_id, &auth.user).await?;

  // The crop must exist on this farm, not merely somewhere.
  let crop = state
    .store
    .get_crop(body.crop_id)
    .await
    .map_err(ApiError::store)?
    .filter(|c| c.farm_id == farm.id)
    .ok_or_else(|| ApiError::not_found("Crop"))?;

  body.farm_id = farm.id;
  body.crop_id = crop.id;
  let batch = state
    .store
    .create_batch(body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(batch = %batch.batch_identifier, farm_id = farm.id, "batch created");
  Ok((StatusCode::CREATED, Json(batch)))
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// `POST /traceability/:ident/events`
pub async fn record_event<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<ChainHandlers>,
  AppPath(ident): AppPath<String>,
  AppJson(body): AppJson<NewTraceabilityEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  body.validate()?;
  let batch = existing_batch(state.store.as_ref(), &ident).await?;
  let event = state
    .store
    .record_event(batch.id, body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    batch = %batch.batch_identifier,
    stage = %event.stage,
    by = %auth.user.username,
    "traceability event recorded"
  );
  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Carbon ───────────────────────────────────────────────────────────────────

/// `POST /traceability/:ident/carbon`: only the owner of the batch's farm.
pub async fn record_carbon<S>(
  State(state): State<AppState<S>>,
  auth: Authorized<Farmers>,
  AppPath(ident): AppPath<String>,
  AppJson(body): AppJson<NewCarbonRecord>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FarmStore + 'static,
{
  body.validate()?;
  let batch = existing_batch(state.store.as_ref(), &ident).await?;
  owned_farm(state.store.as_ref(), batch.farm_id, &auth.user).await?;
  let record = state
    .store
    .record_carbon(batch.id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}
