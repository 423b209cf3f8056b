//! The text-generation seam behind `POST /farms/:id/advisories/generate`.

use async_trait::async_trait;
use fieldtrace_core::farm::{Farm, Location};
use thiserror::Error;

pub const SYSTEM_PROMPT: &str = "You are an expert agricultural advisor. Generate a short, \
                                 actionable advisory based on farm details.";

/// Stored when the model answers with nothing.
pub const EMPTY_COMPLETION: &str = "No advisory generated.";

#[derive(Debug, Error)]
pub enum AdvisorError {
  #[error("advisor is not configured")]
  NotConfigured,

  #[error("request failed: {0}")]
  Request(String),

  #[error("upstream returned {status}: {body}")]
  Status { status: u16, body: String },

  #[error("malformed completion: {0}")]
  Malformed(String),
}

/// Produces advisory text for a farm. One best-effort attempt per call; no
/// retries.
#[async_trait]
pub trait Advisor: Send + Sync {
  async fn advise(&self, farm: &Farm) -> Result<String, AdvisorError>;
}

/// The user turn sent to the model.
pub fn user_prompt(farm: &Farm) -> String {
  let Location { lat, lng } = farm.location;
  format!(
    "Farm: {}, Type: {}, Location: {{\"lat\":{lat},\"lng\":{lng}}}. \
     Generate a weather-based advisory.",
    farm.name, farm.kind
  )
}

/// An advisor that fails every call; used when no API key is configured.
pub struct DisabledAdvisor;

#[async_trait]
impl Advisor for DisabledAdvisor {
  async fn advise(&self, _farm: &Farm) -> Result<String, AdvisorError> {
    Err(AdvisorError::NotConfigured)
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn prompt_names_the_farm() {
    let farm = Farm {
      id:         1,
      user_id:    "u".into(),
      name:       "Green Valley Organics".into(),
      location:   Location { lat: 34.5, lng: -118.25 },
      size:       50.5,
      kind:       "Organic".into(),
      created_at: Utc::now(),
    };
    assert_eq!(
      user_prompt(&farm),
      "Farm: Green Valley Organics, Type: Organic, Location: {\"lat\":34.5,\"lng\":-118.25}. \
       Generate a weather-based advisory."
    );
  }
}
