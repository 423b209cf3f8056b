//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use fieldtrace_core::{
  farm::{Location, NewActivity, NewAdvisory, NewCrop, NewFarm},
  role::{NewUser, Role},
  store::{FarmStore, StoreError},
  trace::{self, NewBatch, NewCarbonRecord, NewTraceabilityEvent, TraceError},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn farm_body(name: &str) -> NewFarm {
  NewFarm {
    name:     name.into(),
    location: Location { lat: 34.05, lng: -118.24 },
    size:     12.5,
    kind:     "Organic".into(),
  }
}

fn crop_body(name: &str) -> NewCrop {
  NewCrop {
    name:                  name.into(),
    variety:               Some("Cherokee Purple".into()),
    planting_date:         Some(at(2024, 3, 15, 0)),
    expected_harvest_date: None,
    status:                "growing".into(),
  }
}

fn event_body(stage: &str, ts: Option<DateTime<Utc>>) -> NewTraceabilityEvent {
  NewTraceabilityEvent {
    stage:              stage.into(),
    location:           "Somewhere".into(),
    handler:            "Someone".into(),
    timestamp:          ts,
    document_hash:      None,
    blockchain_tx_hash: None,
  }
}

fn user_body(id: &str, username: &str, role: Role) -> NewUser {
  NewUser {
    id:            id.into(),
    username:      username.into(),
    role,
    password_hash: "$argon2id$placeholder".into(),
  }
}

/// A farm with one crop and one batch; returns (farm id, crop id, batch id).
async fn batch_fixture(s: &SqliteStore, ident: &str) -> (i64, i64, i64) {
  let farm = s.create_farm("u1".into(), farm_body("Green Valley")).await.unwrap();
  let crop = s.create_crop(farm.id, crop_body("Tomatoes")).await.unwrap();
  let batch = s
    .create_batch(NewBatch {
      farm_id:          farm.id,
      crop_id:          crop.id,
      batch_identifier: ident.into(),
      quantity:         500.0,
      harvest_date:     at(2024, 7, 2, 0),
      status:           "harvested".into(),
    })
    .await
    .unwrap();
  (farm.id, crop.id, batch.id)
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_fetch_user_with_credentials() {
  let s = store().await;
  let user = s.add_user(user_body("id-1", "alice", Role::Farmer)).await.unwrap();
  assert_eq!(user.role, Role::Farmer);

  let fetched = s.get_user("id-1").await.unwrap().unwrap();
  assert_eq!(fetched.username, "alice");

  let (cred_user, hash) = s.get_credentials("alice").await.unwrap().unwrap();
  assert_eq!(cred_user.id, "id-1");
  assert_eq!(hash, "$argon2id$placeholder");

  assert!(s.get_credentials("bob").await.unwrap().is_none());
  assert_eq!(s.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_username_is_a_conflict() {
  let s = store().await;
  s.add_user(user_body("id-1", "alice", Role::Farmer)).await.unwrap();
  let err = s
    .add_user(user_body("id-2", "alice", Role::Consumer))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UsernameTaken(_)));
  assert!(err.is_conflict());
}

#[tokio::test]
async fn set_role_updates_and_reports_missing_users() {
  let s = store().await;
  s.add_user(user_body("id-1", "alice", Role::Consumer)).await.unwrap();

  let updated = s.set_user_role("id-1", Role::Regulator).await.unwrap().unwrap();
  assert_eq!(updated.role, Role::Regulator);
  assert!(s.set_user_role("nobody", Role::Farmer).await.unwrap().is_none());
}

// ─── Farms, crops, activities ────────────────────────────────────────────────

#[tokio::test]
async fn farms_are_listed_per_owner() {
  let s = store().await;
  let a = s.create_farm("u1".into(), farm_body("A")).await.unwrap();
  s.create_farm("u2".into(), farm_body("B")).await.unwrap();
  s.create_farm("u1".into(), farm_body("C")).await.unwrap();

  let mine = s.list_farms_by_user("u1").await.unwrap();
  assert_eq!(mine.len(), 2);
  assert!(mine.iter().all(|f| f.user_id == "u1"));

  let fetched = s.get_farm(a.id).await.unwrap().unwrap();
  assert_eq!(fetched, a);
  assert!(s.get_farm(9_999).await.unwrap().is_none());
}

#[tokio::test]
async fn crops_round_trip_dates() {
  let s = store().await;
  let farm = s.create_farm("u1".into(), farm_body("A")).await.unwrap();
  let crop = s.create_crop(farm.id, crop_body("Wheat")).await.unwrap();

  let crops = s.list_crops_by_farm(farm.id).await.unwrap();
  assert_eq!(crops, vec![crop.clone()]);
  assert_eq!(crops[0].planting_date, Some(at(2024, 3, 15, 0)));
  assert_eq!(s.get_crop(crop.id).await.unwrap(), Some(crop));
}

#[tokio::test]
async fn activities_are_newest_first() {
  let s = store().await;
  let farm = s.create_farm("u1".into(), farm_body("A")).await.unwrap();
  for (kind, day) in [("planting", 1), ("harvesting", 20), ("irrigation", 10)] {
    s.create_activity(farm.id, NewActivity {
      kind:    kind.into(),
      date:    at(2024, 5, day, 0),
      details: None,
    })
    .await
    .unwrap();
  }

  let kinds: Vec<_> = s
    .list_activities_by_farm(farm.id)
    .await
    .unwrap()
    .into_iter()
    .map(|a| a.kind)
    .collect();
  assert_eq!(kinds, ["harvesting", "irrigation", "planting"]);
}

#[tokio::test]
async fn advisories_keep_their_payload() {
  let s = store().await;
  let farm = s.create_farm("u1".into(), farm_body("A")).await.unwrap();
  let advisory = s
    .create_advisory(NewAdvisory {
      farm_id: farm.id,
      kind:    "AI_GENERATED".into(),
      message: "Irrigate early.".into(),
      data:    Some(serde_json::json!({ "generated": true })),
    })
    .await
    .unwrap();
  assert!(!advisory.is_read);

  let listed = s.list_advisories_by_farm(farm.id).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].data, Some(serde_json::json!({ "generated": true })));
}

// ─── Traceability ────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_batch_identifier_is_a_conflict() {
  let s = store().await;
  let (farm_id, crop_id, _) = batch_fixture(&s, "BATCH-1").await;
  let err = s
    .create_batch(NewBatch {
      farm_id,
      crop_id,
      batch_identifier: "BATCH-1".into(),
      quantity: 1.0,
      harvest_date: Utc::now(),
      status: "harvested".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateBatch(ref id) if id == "BATCH-1"));
  assert!(err.is_conflict());
}

#[tokio::test]
async fn events_come_back_oldest_first() {
  let s = store().await;
  let (_, _, batch_id) = batch_fixture(&s, "BATCH-1").await;

  // Inserted out of chronological order.
  s.record_event(batch_id, event_body("Processing", Some(at(2024, 7, 3, 9))))
    .await
    .unwrap();
  s.record_event(batch_id, event_body("Harvest", Some(at(2024, 7, 2, 8))))
    .await
    .unwrap();
  s.record_event(batch_id, event_body("Transport", Some(at(2024, 7, 2, 14))))
    .await
    .unwrap();

  let stages: Vec<_> = s
    .list_batch_events(batch_id)
    .await
    .unwrap()
    .into_iter()
    .map(|e| e.stage)
    .collect();
  assert_eq!(stages, ["Harvest", "Transport", "Processing"]);
}

#[tokio::test]
async fn missing_event_timestamp_defaults_to_now() {
  let s = store().await;
  let (_, _, batch_id) = batch_fixture(&s, "BATCH-1").await;
  let before = Utc::now() - Duration::seconds(1);
  let event = s.record_event(batch_id, event_body("Retail", None)).await.unwrap();
  assert!(event.timestamp >= before);
}

#[tokio::test]
async fn recorded_event_matches_what_is_read_back() {
  let s = store().await;
  let (_, _, batch_id) = batch_fixture(&s, "BATCH-1").await;
  let ts = at(2024, 7, 2, 8) + Duration::nanoseconds(123_456_789);
  let event = s.record_event(batch_id, event_body("Harvest", Some(ts))).await.unwrap();
  assert_eq!(event.timestamp, at(2024, 7, 2, 8) + Duration::microseconds(123_456));

  let listed = s.list_batch_events(batch_id).await.unwrap();
  assert_eq!(listed, vec![event]);
}

#[tokio::test]
async fn one_carbon_record_per_batch() {
  let s = store().await;
  let (_, _, batch_id) = batch_fixture(&s, "BATCH-1").await;
  assert!(s.get_batch_carbon(batch_id).await.unwrap().is_none());

  let body = || NewCarbonRecord { emissions: 120.5, certificate_hash: "0xabc".into() };
  let record = s.record_carbon(batch_id, body()).await.unwrap();
  assert_eq!(s.get_batch_carbon(batch_id).await.unwrap(), Some(record));

  let err = s.record_carbon(batch_id, body()).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateCarbon(id) if id == batch_id));
}

#[tokio::test]
async fn assemble_composes_the_full_view() {
  let s = store().await;
  let (farm_id, crop_id, batch_id) = batch_fixture(&s, "BATCH-1").await;
  s.record_event(batch_id, event_body("Transport", Some(at(2024, 7, 2, 14))))
    .await
    .unwrap();
  s.record_event(batch_id, event_body("Harvest", Some(at(2024, 7, 2, 8))))
    .await
    .unwrap();

  let view = trace::assemble(&s, "BATCH-1").await.unwrap();
  assert_eq!(view.batch.id, batch_id);
  assert_eq!(view.farm.id, farm_id);
  assert_eq!(view.crop.id, crop_id);
  assert_eq!(view.events.len(), 2);
  assert!(view.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
  assert!(view.carbon.is_none());

  let json = serde_json::to_value(&view).unwrap();
  assert_eq!(json["batchIdentifier"], "BATCH-1");
  assert_eq!(json["farm"]["name"], "Green Valley");
  assert!(json["carbon"].is_null());
}

#[tokio::test]
async fn assemble_unknown_batch_is_not_found() {
  let s = store().await;
  batch_fixture(&s, "BATCH-1").await;
  let err = trace::assemble(&s, "BATCH-404").await.unwrap_err();
  assert!(matches!(err, TraceError::BatchNotFound(ref id) if id == "BATCH-404"));
}
