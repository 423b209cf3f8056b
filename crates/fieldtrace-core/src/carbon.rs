//! Rule-based emission estimate over a farm's activity log.

use serde::{Deserialize, Serialize};

use crate::farm::Activity;

pub const DEFAULT_METHODOLOGY: &str = "GHG Protocol v1";

/// Total emissions (kg CO2e) and the methodology that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonEstimate {
  pub emissions:   f64,
  pub methodology: String,
}

/// Fixed per-activity weight. Unknown activity types weigh nothing.
pub fn emission_weight(kind: &str) -> f64 {
  match kind {
    "irrigation" => 2.0,
    "fertilizer" => 5.0,
    "harvest" => 1.0,
    _ => 0.0,
  }
}

/// Sum the weights of `activities` under [`DEFAULT_METHODOLOGY`].
pub fn estimate<'a>(activities: impl IntoIterator<Item = &'a Activity>) -> CarbonEstimate {
  estimate_with(activities, DEFAULT_METHODOLOGY)
}

pub fn estimate_with<'a>(
  activities: impl IntoIterator<Item = &'a Activity>,
  methodology: &str,
) -> CarbonEstimate {
  let emissions = activities
    .into_iter()
    .map(|a| emission_weight(&a.kind))
    .sum::<f64>();
  CarbonEstimate { emissions, methodology: methodology.to_owned() }
}
