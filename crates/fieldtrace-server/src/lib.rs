//! fieldtrace server: configuration, the OpenAI-backed advisor, and demo
//! seeding. The binary in `main.rs` wires these to `fieldtrace_api`.

pub mod config;
pub mod openai;
pub mod seed;

use std::sync::Arc;

use fieldtrace_api::advisor::{Advisor, DisabledAdvisor};

use crate::{config::AdvisorConfig, openai::OpenAiAdvisor};

/// The advisor to serve with: the OpenAI client when a key is configured,
/// otherwise one that fails every call.
pub fn advisor_from_config(config: &AdvisorConfig) -> reqwest::Result<Arc<dyn Advisor>> {
  Ok(match OpenAiAdvisor::from_config(config)? {
    Some(advisor) => Arc::new(advisor),
    None => {
      tracing::warn!("no advisor API key configured; advisory generation is disabled");
      Arc::new(DisabledAdvisor)
    }
  })
}
