//! The `FarmStore` trait: one method per query or insert.
//!
//! The trait is implemented by storage backends (e.g.
//! `fieldtrace-store-sqlite`). Higher layers (`fieldtrace-api`,
//! `fieldtrace-server`) depend on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::{
  farm::{Activity, Advisory, Crop, Farm, NewActivity, NewAdvisory, NewCrop, NewFarm},
  role::{NewUser, Role, User},
  trace::{
    Batch, CarbonRecord, NewBatch, NewCarbonRecord, NewTraceabilityEvent,
    TraceabilityEvent,
  },
};

/// Backend errors must say whether they are a uniqueness conflict
/// (duplicate batch identifier, second carbon record, taken username) so the
/// HTTP layer can answer 409 without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_conflict(&self) -> bool;
}

/// Abstraction over a fieldtrace storage backend.
///
/// Activities, advisories, traceability events and carbon records are
/// append-only. Nothing is ever deleted. Multi-statement operations are not
/// wrapped in transactions.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FarmStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a user. Fails with a conflict if the username is taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Look a user up by login name, returning it with its stored password
  /// hash.
  fn get_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + 'a;

  /// Change a user's role. Returns `None` if the user does not exist.
  fn set_user_role<'a>(
    &'a self,
    id: &'a str,
    role: Role,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn count_users(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Farms ─────────────────────────────────────────────────────────────

  fn create_farm(
    &self,
    user_id: String,
    input: NewFarm,
  ) -> impl Future<Output = Result<Farm, Self::Error>> + Send + '_;

  fn list_farms_by_user<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Farm>, Self::Error>> + Send + 'a;

  fn get_farm(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Farm>, Self::Error>> + Send + '_;

  // ── Crops ─────────────────────────────────────────────────────────────

  fn create_crop(
    &self,
    farm_id: i64,
    input: NewCrop,
  ) -> impl Future<Output = Result<Crop, Self::Error>> + Send + '_;

  fn list_crops_by_farm(
    &self,
    farm_id: i64,
  ) -> impl Future<Output = Result<Vec<Crop>, Self::Error>> + Send + '_;

  fn get_crop(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Crop>, Self::Error>> + Send + '_;

  // ── Activities ────────────────────────────────────────────────────────

  /// Append to a farm's activity log. `logged_at` is set by the store.
  fn create_activity(
    &self,
    farm_id: i64,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  /// Newest first by `date`.
  fn list_activities_by_farm(
    &self,
    farm_id: i64,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  // ── Advisories ────────────────────────────────────────────────────────

  fn create_advisory(
    &self,
    input: NewAdvisory,
  ) -> impl Future<Output = Result<Advisory, Self::Error>> + Send + '_;

  /// Newest first by `created_at`.
  fn list_advisories_by_farm(
    &self,
    farm_id: i64,
  ) -> impl Future<Output = Result<Vec<Advisory>, Self::Error>> + Send + '_;

  // ── Traceability ──────────────────────────────────────────────────────

  /// Fails with a conflict if the batch identifier is already in use.
  fn create_batch(
    &self,
    input: NewBatch,
  ) -> impl Future<Output = Result<Batch, Self::Error>> + Send + '_;

  fn get_batch_by_identifier<'a>(
    &'a self,
    batch_identifier: &'a str,
  ) -> impl Future<Output = Result<Option<Batch>, Self::Error>> + Send + 'a;

  /// Append an event. A missing timestamp means "now".
  fn record_event(
    &self,
    batch_id: i64,
    input: NewTraceabilityEvent,
  ) -> impl Future<Output = Result<TraceabilityEvent, Self::Error>> + Send + '_;

  /// Oldest first by `timestamp`; ties keep insertion order.
  fn list_batch_events(
    &self,
    batch_id: i64,
  ) -> impl Future<Output = Result<Vec<TraceabilityEvent>, Self::Error>> + Send + '_;

  /// Fails with a conflict if the batch already has a carbon record.
  fn record_carbon(
    &self,
    batch_id: i64,
    input: NewCarbonRecord,
  ) -> impl Future<Output = Result<CarbonRecord, Self::Error>> + Send + '_;

  fn get_batch_carbon(
    &self,
    batch_id: i64,
  ) -> impl Future<Output = Result<Option<CarbonRecord>, Self::Error>> + Send + '_;
}
