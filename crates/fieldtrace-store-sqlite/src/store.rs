//! The SQLite implementation of [`FarmStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, Row, types::Value};

use fieldtrace_core::{
  farm::{Activity, Advisory, Crop, Farm, NewActivity, NewAdvisory, NewCrop, NewFarm},
  role::{NewUser, Role, User},
  store::FarmStore,
  trace::{
    Batch, CarbonRecord, NewBatch, NewCarbonRecord, NewTraceabilityEvent,
    TraceabilityEvent,
  },
};

use crate::{
  Error, Result,
  encode::{
    ACTIVITY_COLUMNS, ADVISORY_COLUMNS, BATCH_COLUMNS, CARBON_COLUMNS, CROP_COLUMNS,
    EVENT_COLUMNS, FARM_COLUMNS, RawActivity, RawAdvisory, RawBatch, RawCarbon, RawCrop,
    RawEvent, RawFarm, RawUser, USER_COLUMNS, encode_dt, encode_location, encode_role, stored_dt,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A fieldtrace store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `sql` with a single bound `key` and collect every row.
  async fn select_many<R>(
    &self,
    sql: String,
    key: Value,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Vec<R>>
  where
    R: Send + 'static,
  {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([key], read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  /// Run `sql` with a single bound `key`; `None` if no row matches.
  async fn select_one<R>(
    &self,
    sql: String,
    key: Value,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
  ) -> Result<Option<R>>
  where
    R: Send + 'static,
  {
    let row = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [key], read).optional()?))
      .await?;
    Ok(row)
  }
}

// ─── FarmStore impl ──────────────────────────────────────────────────────────

impl FarmStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         input.id,
      username:   input.username,
      role:       input.role,
      created_at: stored_dt(Utc::now()),
    };

    let id_str   = user.id.clone();
    let name_str = user.username.clone();
    let role_str = encode_role(user.role).to_owned();
    let at_str   = encode_dt(user.created_at);
    let hash     = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![name_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO users (id, username, password_hash, role, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name_str, hash, role_str, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(user.username));
    }
    Ok(user)
  }

  async fn get_user(&self, id: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    self
      .select_one(sql, Value::Text(id.to_owned()), RawUser::from_row)
      .await?
      .map(RawUser::into_user)
      .transpose()
  }

  async fn get_credentials(&self, username: &str) -> Result<Option<(User, String)>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    self
      .select_one(sql, Value::Text(username.to_owned()), RawUser::from_row)
      .await?
      .map(RawUser::into_credentials)
      .transpose()
  }

  async fn set_user_role(&self, id: &str, role: Role) -> Result<Option<User>> {
    let id_str   = id.to_owned();
    let role_str = encode_role(role).to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET role = ?2 WHERE id = ?1",
          rusqlite::params![id_str, role_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_user(id).await
  }

  async fn count_users(&self) -> Result<u64> {
    let count: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
      .await?;
    Ok(count.max(0) as u64)
  }

  // ── Farms ─────────────────────────────────────────────────────────────────

  async fn create_farm(&self, user_id: String, input: NewFarm) -> Result<Farm> {
    let mut farm = Farm {
      id: 0,
      user_id,
      name: input.name,
      location: input.location,
      size: input.size,
      kind: input.kind,
      created_at: stored_dt(Utc::now()),
    };

    let user_id_str  = farm.user_id.clone();
    let name         = farm.name.clone();
    let location_str = encode_location(&farm.location)?;
    let size         = farm.size;
    let kind         = farm.kind.clone();
    let at_str       = encode_dt(farm.created_at);

    farm.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO farms (user_id, name, location, size, type, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![user_id_str, name, location_str, size, kind, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(farm)
  }

  async fn list_farms_by_user(&self, user_id: &str) -> Result<Vec<Farm>> {
    let sql = format!("SELECT {FARM_COLUMNS} FROM farms WHERE user_id = ?1 ORDER BY id");
    self
      .select_many(sql, Value::Text(user_id.to_owned()), RawFarm::from_row)
      .await?
      .into_iter()
      .map(RawFarm::into_farm)
      .collect()
  }

  async fn get_farm(&self, id: i64) -> Result<Option<Farm>> {
    let sql = format!("SELECT {FARM_COLUMNS} FROM farms WHERE id = ?1");
    self
      .select_one(sql, Value::Integer(id), RawFarm::from_row)
      .await?
      .map(RawFarm::into_farm)
      .transpose()
  }

  // ── Crops ─────────────────────────────────────────────────────────────────

  async fn create_crop(&self, farm_id: i64, input: NewCrop) -> Result<Crop> {
    let mut crop = Crop {
      id: 0,
      farm_id,
      name: input.name,
      variety: input.variety,
      planting_date: input.planting_date.map(stored_dt),
      expected_harvest_date: input.expected_harvest_date.map(stored_dt),
      status: input.status,
    };

    let name         = crop.name.clone();
    let variety      = crop.variety.clone();
    let planting_str = crop.planting_date.map(encode_dt);
    let expected_str = crop.expected_harvest_date.map(encode_dt);
    let status       = crop.status.clone();

    crop.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO crops (farm_id, name, variety, planting_date, expected_harvest_date, status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![farm_id, name, variety, planting_str, expected_str, status],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(crop)
  }

  async fn list_crops_by_farm(&self, farm_id: i64) -> Result<Vec<Crop>> {
    let sql = format!("SELECT {CROP_COLUMNS} FROM crops WHERE farm_id = ?1 ORDER BY id");
    self
      .select_many(sql, Value::Integer(farm_id), RawCrop::from_row)
      .await?
      .into_iter()
      .map(RawCrop::into_crop)
      .collect()
  }

  async fn get_crop(&self, id: i64) -> Result<Option<Crop>> {
    let sql = format!("SELECT {CROP_COLUMNS} FROM crops WHERE id = ?1");
    self
      .select_one(sql, Value::Integer(id), RawCrop::from_row)
      .await?
      .map(RawCrop::into_crop)
      .transpose()
  }

  // ── Activities ────────────────────────────────────────────────────────────

  async fn create_activity(&self, farm_id: i64, input: NewActivity) -> Result<Activity> {
    let mut activity = Activity {
      id: 0,
      farm_id,
      kind: input.kind,
      date: stored_dt(input.date),
      details: input.details,
      logged_at: stored_dt(Utc::now()),
    };

    let kind      = activity.kind.clone();
    let date_str  = encode_dt(activity.date);
    let details   = activity.details.clone();
    let at_str    = encode_dt(activity.logged_at);

    activity.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activities (farm_id, type, date, details, logged_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![farm_id, kind, date_str, details, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(activity)
  }

  async fn list_activities_by_farm(&self, farm_id: i64) -> Result<Vec<Activity>> {
    let sql = format!(
      "SELECT {ACTIVITY_COLUMNS} FROM activities WHERE farm_id = ?1
       ORDER BY date DESC, id DESC"
    );
    self
      .select_many(sql, Value::Integer(farm_id), RawActivity::from_row)
      .await?
      .into_iter()
      .map(RawActivity::into_activity)
      .collect()
  }

  // ── Advisories ────────────────────────────────────────────────────────────

  async fn create_advisory(&self, input: NewAdvisory) -> Result<Advisory> {
    let mut advisory = Advisory {
      id:         0,
      farm_id:    input.farm_id,
      kind:       input.kind,
      message:    input.message,
      data:       input.data,
      created_at: stored_dt(Utc::now()),
      is_read:    false,
    };

    let farm_id  = advisory.farm_id;
    let kind     = advisory.kind.clone();
    let message  = advisory.message.clone();
    let data_str = advisory
      .data
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let at_str   = encode_dt(advisory.created_at);

    advisory.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO advisories (farm_id, type, message, data, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![farm_id, kind, message, data_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(advisory)
  }

  async fn list_advisories_by_farm(&self, farm_id: i64) -> Result<Vec<Advisory>> {
    let sql = format!(
      "SELECT {ADVISORY_COLUMNS} FROM advisories WHERE farm_id = ?1
       ORDER BY created_at DESC, id DESC"
    );
    self
      .select_many(sql, Value::Integer(farm_id), RawAdvisory::from_row)
      .await?
      .into_iter()
      .map(RawAdvisory::into_advisory)
      .collect()
  }

  // ── Traceability ──────────────────────────────────────────────────────────

  async fn create_batch(&self, input: NewBatch) -> Result<Batch> {
    let mut batch = Batch {
      id:               0,
      farm_id:          input.farm_id,
      crop_id:          input.crop_id,
      batch_identifier: input.batch_identifier,
      quantity:         input.quantity,
      harvest_date:     stored_dt(input.harvest_date),
      status:           input.status,
    };

    let farm_id     = batch.farm_id;
    let crop_id     = batch.crop_id;
    let ident       = batch.batch_identifier.clone();
    let quantity    = batch.quantity;
    let harvest_str = encode_dt(batch.harvest_date);
    let status      = batch.status.clone();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM batches WHERE batch_identifier = ?1",
            rusqlite::params![ident],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO batches (farm_id, crop_id, batch_identifier, quantity, harvest_date, status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![farm_id, crop_id, ident, quantity, harvest_str, status],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    batch.id = id.ok_or_else(|| Error::DuplicateBatch(batch.batch_identifier.clone()))?;
    Ok(batch)
  }

  async fn get_batch_by_identifier(&self, batch_identifier: &str) -> Result<Option<Batch>> {
    let sql = format!("SELECT {BATCH_COLUMNS} FROM batches WHERE batch_identifier = ?1");
    self
      .select_one(sql, Value::Text(batch_identifier.to_owned()), RawBatch::from_row)
      .await?
      .map(RawBatch::into_batch)
      .transpose()
  }

  async fn record_event(
    &self,
    batch_id: i64,
    input:    NewTraceabilityEvent,
  ) -> Result<TraceabilityEvent> {
    let mut event = TraceabilityEvent {
      id: 0,
      batch_id,
      stage: input.stage,
      location: input.location,
      handler: input.handler,
      timestamp: stored_dt(input.timestamp.unwrap_or_else(Utc::now)),
      document_hash: input.document_hash,
      blockchain_tx_hash: input.blockchain_tx_hash,
    };

    let stage    = event.stage.clone();
    let location = event.location.clone();
    let handler  = event.handler.clone();
    let ts_str   = encode_dt(event.timestamp);
    let doc      = event.document_hash.clone();
    let tx       = event.blockchain_tx_hash.clone();

    event.id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO traceability_events (
             batch_id, stage, location, handler, timestamp,
             document_hash, blockchain_tx_hash
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![batch_id, stage, location, handler, ts_str, doc, tx],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(event)
  }

  async fn list_batch_events(&self, batch_id: i64) -> Result<Vec<TraceabilityEvent>> {
    let sql = format!(
      "SELECT {EVENT_COLUMNS} FROM traceability_events WHERE batch_id = ?1
       ORDER BY timestamp ASC, id ASC"
    );
    self
      .select_many(sql, Value::Integer(batch_id), RawEvent::from_row)
      .await?
      .into_iter()
      .map(RawEvent::into_event)
      .collect()
  }

  async fn record_carbon(&self, batch_id: i64, input: NewCarbonRecord) -> Result<CarbonRecord> {
    let mut record = CarbonRecord {
      id: 0,
      batch_id,
      emissions: input.emissions,
      certificate_hash: input.certificate_hash,
      created_at: stored_dt(Utc::now()),
    };

    let emissions = record.emissions;
    let cert      = record.certificate_hash.clone();
    let at_str    = encode_dt(record.created_at);

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM carbon_records WHERE batch_id = ?1",
            rusqlite::params![batch_id],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO carbon_records (batch_id, emissions, certificate_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![batch_id, emissions, cert, at_str],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    record.id = id.ok_or(Error::DuplicateCarbon(batch_id))?;
    Ok(record)
  }

  async fn get_batch_carbon(&self, batch_id: i64) -> Result<Option<CarbonRecord>> {
    let sql = format!("SELECT {CARBON_COLUMNS} FROM carbon_records WHERE batch_id = ?1");
    self
      .select_one(sql, Value::Integer(batch_id), RawCarbon::from_row)
      .await?
      .map(RawCarbon::into_carbon)
      .transpose()
  }
}
