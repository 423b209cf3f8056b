//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings
//! (microsecond precision, `Z` suffix) so that `ORDER BY` on the text column
//! is chronological. Farm locations and advisory payloads are stored as
//! compact JSON.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use fieldtrace_core::{
  farm::{Activity, Advisory, Crop, Farm, Location},
  role::{Role, User},
  trace::{Batch, CarbonRecord, TraceabilityEvent},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// `dt` at the precision [`encode_dt`] keeps, so a returned record matches
/// what a later read decodes.
pub fn stored_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str { role.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

// ─── Location ────────────────────────────────────────────────────────────────

pub fn encode_location(loc: &Location) -> Result<String> {
  Ok(serde_json::to_string(loc)?)
}

pub fn decode_location(s: &str) -> Result<Location> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `Raw*` holds the column values exactly as read. Rows are read inside
// the connection closure; decoding into domain types happens outside it so
// decode failures surface as this crate's `Error`.

pub const USER_COLUMNS: &str = "id, username, role, created_at, password_hash";

/// Raw values read from a `users` row.
pub struct RawUser {
  pub id:            String,
  pub username:      String,
  pub role:          String,
  pub created_at:    String,
  pub password_hash: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      username:      row.get(1)?,
      role:          row.get(2)?,
      created_at:    row.get(3)?,
      password_hash: row.get(4)?,
    })
  }

  pub fn into_user(self) -> Result<User> { Ok(self.into_credentials()?.0) }

  pub fn into_credentials(self) -> Result<(User, String)> {
    let user = User {
      id:         self.id,
      username:   self.username,
      role:       decode_role(&self.role)?,
      created_at: decode_dt(&self.created_at)?,
    };
    Ok((user, self.password_hash))
  }
}

pub const FARM_COLUMNS: &str = "id, user_id, name, location, size, type, created_at";

pub struct RawFarm {
  pub id:         i64,
  pub user_id:    String,
  pub name:       String,
  pub location:   String,
  pub size:       f64,
  pub kind:       String,
  pub created_at: String,
}

impl RawFarm {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      user_id:    row.get(1)?,
      name:       row.get(2)?,
      location:   row.get(3)?,
      size:       row.get(4)?,
      kind:       row.get(5)?,
      created_at: row.get(6)?,
    })
  }

  pub fn into_farm(self) -> Result<Farm> {
    Ok(Farm {
      id:         self.id,
      user_id:    self.user_id,
      name:       self.name,
      location:   decode_location(&self.location)?,
      size:       self.size,
      kind:       self.kind,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CROP_COLUMNS: &str =
  "id, farm_id, name, variety, planting_date, expected_harvest_date, status";

pub struct RawCrop {
  pub id:                    i64,
  pub farm_id:               i64,
  pub name:                  String,
  pub variety:               Option<String>,
  pub planting_date:         Option<String>,
  pub expected_harvest_date: Option<String>,
  pub status:                String,
}

impl RawCrop {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                    row.get(0)?,
      farm_id:               row.get(1)?,
      name:                  row.get(2)?,
      variety:               row.get(3)?,
      planting_date:         row.get(4)?,
      expected_harvest_date: row.get(5)?,
      status:                row.get(6)?,
    })
  }

  pub fn into_crop(self) -> Result<Crop> {
    Ok(Crop {
      id:                    self.id,
      farm_id:               self.farm_id,
      name:                  self.name,
      variety:               self.variety,
      planting_date:         decode_opt_dt(self.planting_date)?,
      expected_harvest_date: decode_opt_dt(self.expected_harvest_date)?,
      status:                self.status,
    })
  }
}

pub const ACTIVITY_COLUMNS: &str = "id, farm_id, type, date, details, logged_at";

pub struct RawActivity {
  pub id:        i64,
  pub farm_id:   i64,
  pub kind:      String,
  pub date:      String,
  pub details:   Option<String>,
  pub logged_at: String,
}

impl RawActivity {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      farm_id:   row.get(1)?,
      kind:      row.get(2)?,
      date:      row.get(3)?,
      details:   row.get(4)?,
      logged_at: row.get(5)?,
    })
  }

  pub fn into_activity(self) -> Result<Activity> {
    Ok(Activity {
      id:        self.id,
      farm_id:   self.farm_id,
      kind:      self.kind,
      date:      decode_dt(&self.date)?,
      details:   self.details,
      logged_at: decode_dt(&self.logged_at)?,
    })
  }
}

pub const ADVISORY_COLUMNS: &str = "id, farm_id, type, message, data, created_at, is_read";

pub struct RawAdvisory {
  pub id:         i64,
  pub farm_id:    i64,
  pub kind:       String,
  pub message:    String,
  pub data:       Option<String>,
  pub created_at: String,
  pub is_read:    bool,
}

impl RawAdvisory {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      farm_id:    row.get(1)?,
      kind:       row.get(2)?,
      message:    row.get(3)?,
      data:       row.get(4)?,
      created_at: row.get(5)?,
      is_read:    row.get(6)?,
    })
  }

  pub fn into_advisory(self) -> Result<Advisory> {
    Ok(Advisory {
      id:         self.id,
      farm_id:    self.farm_id,
      kind:       self.kind,
      message:    self.message,
      data:       self.data.as_deref().map(serde_json::from_str).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      is_read:    self.is_read,
    })
  }
}

pub const BATCH_COLUMNS: &str =
  "id, farm_id, crop_id, batch_identifier, quantity, harvest_date, status";

pub struct RawBatch {
  pub id:               i64,
  pub farm_id:          i64,
  pub crop_id:          i64,
  pub batch_identifier: String,
  pub quantity:         f64,
  pub harvest_date:     String,
  pub status:           String,
}

impl RawBatch {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      farm_id:          row.get(1)?,
      crop_id:          row.get(2)?,
      batch_identifier: row.get(3)?,
      quantity:         row.get(4)?,
      harvest_date:     row.get(5)?,
      status:           row.get(6)?,
    })
  }

  pub fn into_batch(self) -> Result<Batch> {
    Ok(Batch {
      id:               self.id,
      farm_id:          self.farm_id,
      crop_id:          self.crop_id,
      batch_identifier: self.batch_identifier,
      quantity:         self.quantity,
      harvest_date:     decode_dt(&self.harvest_date)?,
      status:           self.status,
    })
  }
}

pub const EVENT_COLUMNS: &str = "id, batch_id, stage, location, handler, timestamp, \
                                 document_hash, blockchain_tx_hash";

pub struct RawEvent {
  pub id:                 i64,
  pub batch_id:           i64,
  pub stage:              String,
  pub location:           String,
  pub handler:            String,
  pub timestamp:          String,
  pub document_hash:      Option<String>,
  pub blockchain_tx_hash: Option<String>,
}

impl RawEvent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      batch_id:           row.get(1)?,
      stage:              row.get(2)?,
      location:           row.get(3)?,
      handler:            row.get(4)?,
      timestamp:          row.get(5)?,
      document_hash:      row.get(6)?,
      blockchain_tx_hash: row.get(7)?,
    })
  }

  pub fn into_event(self) -> Result<TraceabilityEvent> {
    Ok(TraceabilityEvent {
      id:                 self.id,
      batch_id:           self.batch_id,
      stage:              self.stage,
      location:           self.location,
      handler:            self.handler,
      timestamp:          decode_dt(&self.timestamp)?,
      document_hash:      self.document_hash,
      blockchain_tx_hash: self.blockchain_tx_hash,
    })
  }
}

pub const CARBON_COLUMNS: &str = "id, batch_id, emissions, certificate_hash, created_at";

pub struct RawCarbon {
  pub id:               i64,
  pub batch_id:         i64,
  pub emissions:        f64,
  pub certificate_hash: String,
  pub created_at:       String,
}

impl RawCarbon {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      batch_id:         row.get(1)?,
      emissions:        row.get(2)?,
      certificate_hash: row.get(3)?,
      created_at:       row.get(4)?,
    })
  }

  pub fn into_carbon(self) -> Result<CarbonRecord> {
    Ok(CarbonRecord {
      id:               self.id,
      batch_id:         self.batch_id,
      emissions:        self.emissions,
      certificate_hash: self.certificate_hash,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}
