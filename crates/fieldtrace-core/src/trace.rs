//! Batches, their journey events, carbon records, and the assembler that
//! turns a public batch identifier into one composed read-only view.
//!
//! A batch's `batch_identifier` is globally unique and is the only key ever
//! exposed on the unauthenticated traceability endpoint; the numeric id stays
//! internal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  Result,
  error::{ensure, ensure_date},
  farm::{Crop, Farm},
  store::FarmStore,
};

// ─── Batch ───────────────────────────────────────────────────────────────────

pub const DEFAULT_BATCH_STATUS: &str = "harvested";

fn default_batch_status() -> String { DEFAULT_BATCH_STATUS.to_owned() }

/// A traceable unit of harvested produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
  pub id:               i64,
  pub farm_id:          i64,
  pub crop_id:          i64,
  pub batch_identifier: String,
  pub quantity:         f64,
  pub harvest_date:     DateTime<Utc>,
  /// `harvested`, `processing`, `retail`, `sold`.
  pub status:           String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
  #[serde(skip)]
  pub farm_id:          i64,
  pub crop_id:          i64,
  pub batch_identifier: String,
  pub quantity:         f64,
  pub harvest_date:     DateTime<Utc>,
  #[serde(default = "default_batch_status")]
  pub status:           String,
}

impl NewBatch {
  pub fn validate(&self) -> Result<()> {
    ensure(
      !self.batch_identifier.is_empty(),
      "Batch identifier is required",
    )?;
    ensure(
      !self.batch_identifier.contains(char::is_whitespace),
      "Batch identifier must not contain whitespace",
    )?;
    ensure(
      self.quantity.is_finite() && self.quantity > 0.0,
      "Batch quantity must be positive",
    )?;
    ensure(!self.status.trim().is_empty(), "Batch status must not be empty")?;
    ensure_date(Some(self.harvest_date), "Harvest date is out of range")
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// One recorded step (harvest, transport, processing, retail) in a batch's
/// journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityEvent {
  pub id:                 i64,
  pub batch_id:           i64,
  pub stage:              String,
  pub location:           String,
  /// Person or company responsible for this step.
  pub handler:            String,
  pub timestamp:          DateTime<Utc>,
  /// Content address of a supporting document (IPFS CID).
  pub document_hash:      Option<String>,
  pub blockchain_tx_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTraceabilityEvent {
  pub stage:              String,
  pub location:           String,
  pub handler:            String,
  pub timestamp:          Option<DateTime<Utc>>,
  pub document_hash:      Option<String>,
  pub blockchain_tx_hash: Option<String>,
}

impl NewTraceabilityEvent {
  pub fn validate(&self) -> Result<()> {
    ensure(!self.stage.trim().is_empty(), "Event stage is required")?;
    ensure(!self.location.trim().is_empty(), "Event location is required")?;
    ensure(!self.handler.trim().is_empty(), "Event handler is required")?;
    ensure_date(self.timestamp, "Event timestamp is out of range")
  }
}

// ─── Carbon ──────────────────────────────────────────────────────────────────

/// Certified emissions for a batch. At most one per batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonRecord {
  pub id:               i64,
  pub batch_id:         i64,
  /// kg CO2e.
  pub emissions:        f64,
  pub certificate_hash: String,
  pub created_at:       DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCarbonRecord {
  pub emissions:        f64,
  pub certificate_hash: String,
}

impl NewCarbonRecord {
  pub fn validate(&self) -> Result<()> {
    ensure(
      self.emissions.is_finite() && self.emissions >= 0.0,
      "Emissions must be a non-negative number",
    )?;
    ensure(
      !self.certificate_hash.trim().is_empty(),
      "Certificate hash is required",
    )
  }
}

// ─── Assembled view ──────────────────────────────────────────────────────────

/// Batch fields merged with the farm, crop, ordered events and optional
/// carbon record. Computed on every read, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct TraceabilityView {
  #[serde(flatten)]
  pub batch:  Batch,
  pub farm:   Farm,
  pub crop:   Crop,
  /// Oldest first.
  pub events: Vec<TraceabilityEvent>,
  pub carbon: Option<CarbonRecord>,
}

#[derive(Debug, Error)]
pub enum TraceError<E> {
  #[error("batch {0:?} not found")]
  BatchNotFound(String),

  #[error("batch {batch_identifier:?} references missing {entity} {id}")]
  Dangling {
    batch_identifier: String,
    entity:           &'static str,
    id:               i64,
  },

  #[error("store error: {0}")]
  Store(#[source] E),
}

/// Look up `batch_identifier` and compose its [`TraceabilityView`].
///
/// Pure read composition: safe to call concurrently any number of times. A
/// missing carbon record is not an error.
pub async fn assemble<S: FarmStore>(
  store: &S,
  batch_identifier: &str,
) -> Result<TraceabilityView, TraceError<S::Error>> {
  let batch = store
    .get_batch_by_identifier(batch_identifier)
    .await
    .map_err(TraceError::Store)?
    .ok_or_else(|| TraceError::BatchNotFound(batch_identifier.to_owned()))?;

  let mut events = store
    .list_batch_events(batch.id)
    .await
    .map_err(TraceError::Store)?;
  // Stable: equal timestamps keep the backend's insertion order.
  events.sort_by_key(|e| e.timestamp);

  let carbon = store
    .get_batch_carbon(batch.id)
    .await
    .map_err(TraceError::Store)?;

  let dangling = |entity, id| TraceError::Dangling {
    batch_identifier: batch.batch_identifier.clone(),
    entity,
    id,
  };

  let farm = store
    .get_farm(batch.farm_id)
    .await
    .map_err(TraceError::Store)?
    .ok_or_else(|| dangling("farm", batch.farm_id))?;

  let crop = store
    .get_crop(batch.crop_id)
    .await
    .map_err(TraceError::Store)?
    .ok_or_else(|| dangling("crop", batch.crop_id))?;

  Ok(TraceabilityView { batch, farm, crop, events, carbon })
}

/// Midnight UTC on `date`; convenience for date-only inputs.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(chrono::NaiveTime::MIN).and_utc()
}
