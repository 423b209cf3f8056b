//! Demo data written into an empty database at startup.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use fieldtrace_core::{
  farm::{Location, NewCrop, NewFarm},
  role::{NewUser, Role},
  store::FarmStore,
  trace::{NewBatch, NewCarbonRecord, NewTraceabilityEvent, start_of_day},
};
use tracing::info;

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_BATCH: &str = "BATCH-2024-GT-001";

/// Not a PHC string, so the demo account can never log in.
const LOCKED_PASSWORD: &str = "!";

/// `(stage, timestamp, location, handler)` for the demo batch.
const DEMO_EVENTS: &[(&str, (u32, u32, u32), &str, &str)] = &[
  ("Harvest", (7, 2, 8), "Field A, Green Valley", "John Doe"),
  ("Transport", (7, 2, 14), "Transit to Processing Center", "Logistics Co."),
  ("Processing", (7, 3, 9), "Processing Center #4", "FreshPack Inc."),
];

fn day(month: u32, day: u32) -> Option<DateTime<Utc>> {
  NaiveDate::from_ymd_opt(2024, month, day).map(start_of_day)
}

fn hour(month: u32, day: u32, hour: u32) -> Option<DateTime<Utc>> {
  Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0).single()
}

/// Seed one farmer, farm, crop, batch with three events, and a carbon record.
///
/// Does nothing and returns `false` if any user already exists. Steps are not
/// transactional; a failure part-way leaves what was written.
pub async fn seed_demo_data<S: FarmStore>(store: &S) -> Result<bool, S::Error> {
  if store.count_users().await? > 0 {
    return Ok(false);
  }

  let user = store
    .add_user(NewUser {
      id:            DEMO_USER_ID.to_owned(),
      username:      DEMO_USER_ID.to_owned(),
      role:          Role::Farmer,
      password_hash: LOCKED_PASSWORD.to_owned(),
    })
    .await?;

  let farm = store
    .create_farm(user.id, NewFarm {
      name:     "Green Valley Organics".into(),
      location: Location { lat: 34.0522, lng: -118.2437 },
      size:     50.5,
      kind:     "Organic".into(),
    })
    .await?;

  let crop = store
    .create_crop(farm.id, NewCrop {
      name:                  "Heirloom Tomatoes".into(),
      variety:               Some("Cherokee Purple".into()),
      planting_date:         day(3, 15),
      expected_harvest_date: day(7, 1),
      status:                "harvested".into(),
    })
    .await?;

  let harvest_date = day(7, 2).unwrap_or_else(Utc::now);
  let batch = store
    .create_batch(NewBatch {
      farm_id: farm.id,
      crop_id: crop.id,
      batch_identifier: DEMO_BATCH.into(),
      quantity: 500.0,
      harvest_date,
      status: "processing".into(),
    })
    .await?;

  for &(stage, (m, d, h), location, handler) in DEMO_EVENTS {
    store
      .record_event(batch.id, NewTraceabilityEvent {
        stage:              stage.into(),
        location:           location.into(),
        handler:            handler.into(),
        timestamp:          hour(m, d, h),
        document_hash:      None,
        blockchain_tx_hash: None,
      })
      .await?;
  }

  store
    .record_carbon(batch.id, NewCarbonRecord {
      emissions:        120.5,
      certificate_hash: "0xabc123...".into(),
    })
    .await?;

  info!(batch = DEMO_BATCH, "seeded demo data");
  Ok(true)
}
