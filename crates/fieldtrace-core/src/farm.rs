//! Farms and the records that hang off them: crops, activities, advisories.
//!
//! A farm is owned by exactly one user. Crops, activities and advisories are
//! children of exactly one farm; activities and advisories are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  error::{ensure, ensure_date},
};

// ─── Farm ────────────────────────────────────────────────────────────────────

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub lat: f64,
  pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
  pub id:         i64,
  pub user_id:    String,
  pub name:       String,
  pub location:   Location,
  /// In hectares.
  pub size:       f64,
  /// e.g. `Organic`, `Conventional`.
  #[serde(rename = "type")]
  pub kind:       String,
  pub created_at: DateTime<Utc>,
}

/// Body accepted when creating a farm. The owner comes from the session.
#[derive(Debug, Clone, Deserialize)]
pub struct NewFarm {
  pub name:     String,
  pub location: Location,
  pub size:     f64,
  #[serde(rename = "type")]
  pub kind:     String,
}

impl NewFarm {
  pub fn validate(&self) -> Result<()> {
    ensure(!self.name.trim().is_empty(), "Farm name is required")?;
    ensure(
      self.size.is_finite() && self.size > 0.0,
      "Farm size must be a positive number of hectares",
    )?;
    ensure(
      (-90.0..=90.0).contains(&self.location.lat),
      "Latitude must be between -90 and 90",
    )?;
    ensure(
      (-180.0..=180.0).contains(&self.location.lng),
      "Longitude must be between -180 and 180",
    )?;
    ensure(!self.kind.trim().is_empty(), "Farm type is required")
  }
}

/// `GET /api/farms/:id` payload: the farm plus its crops and activity log.
#[derive(Debug, Clone, Serialize)]
pub struct FarmDetails {
  #[serde(flatten)]
  pub farm:       Farm,
  pub crops:      Vec<Crop>,
  pub activities: Vec<Activity>,
}

// ─── Crop ────────────────────────────────────────────────────────────────────

pub const DEFAULT_CROP_STATUS: &str = "growing";

fn default_crop_status() -> String { DEFAULT_CROP_STATUS.to_owned() }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
  pub id:                    i64,
  pub farm_id:               i64,
  pub name:                  String,
  pub variety:               Option<String>,
  pub planting_date:         Option<DateTime<Utc>>,
  pub expected_harvest_date: Option<DateTime<Utc>>,
  /// `growing`, `harvested`, ...
  pub status:                String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCrop {
  pub name:                  String,
  pub variety:               Option<String>,
  pub planting_date:         Option<DateTime<Utc>>,
  pub expected_harvest_date: Option<DateTime<Utc>>,
  #[serde(default = "default_crop_status")]
  pub status:                String,
}

impl NewCrop {
  pub fn validate(&self) -> Result<()> {
    ensure(!self.name.trim().is_empty(), "Crop name is required")?;
    ensure(!self.status.trim().is_empty(), "Crop status must not be empty")?;
    ensure_date(self.planting_date, "Planting date is out of range")?;
    ensure_date(
      self.expected_harvest_date,
      "Expected harvest date is out of range",
    )
  }
}

// ─── Activity ────────────────────────────────────────────────────────────────

/// One entry in a farm's activity log.
///
/// `kind` is usually one of `planting`, `irrigation`, `fertilizer`,
/// `pest_control` or `harvesting`, but any non-empty label is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
  pub id:        i64,
  pub farm_id:   i64,
  #[serde(rename = "type")]
  pub kind:      String,
  pub date:      DateTime<Utc>,
  pub details:   Option<String>,
  pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
  #[serde(rename = "type")]
  pub kind:    String,
  pub date:    DateTime<Utc>,
  pub details: Option<String>,
}

impl NewActivity {
  pub fn validate(&self) -> Result<()> {
    ensure(!self.kind.trim().is_empty(), "Activity type is required")?;
    ensure_date(Some(self.date), "Activity date is out of range")
  }
}

// ─── Advisory ────────────────────────────────────────────────────────────────

/// Type tag given to advisories produced by the text-generation call.
pub const AI_GENERATED: &str = "AI_GENERATED";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
  pub id:         i64,
  pub farm_id:    i64,
  #[serde(rename = "type")]
  pub kind:       String,
  pub message:    String,
  /// Opaque payload, e.g. the weather data an advisory was derived from.
  pub data:       Option<serde_json::Value>,
  pub created_at: DateTime<Utc>,
  pub is_read:    bool,
}

#[derive(Debug, Clone)]
pub struct NewAdvisory {
  pub farm_id: i64,
  pub kind:    String,
  pub message: String,
  pub data:    Option<serde_json::Value>,
}
