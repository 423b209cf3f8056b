//! [`Advisor`] backed by an OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use fieldtrace_api::advisor::{Advisor, AdvisorError, SYSTEM_PROMPT, user_prompt};
use fieldtrace_core::farm::Farm;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AdvisorConfig;

pub struct OpenAiAdvisor {
  client:                Client,
  url:                   String,
  api_key:               String,
  model:                 String,
  max_completion_tokens: u32,
}

impl OpenAiAdvisor {
  /// Build a client from `config`. Returns `Ok(None)` when no API key is set.
  pub fn from_config(config: &AdvisorConfig) -> reqwest::Result<Option<Self>> {
    let Some(api_key) = config.api_key.clone().filter(|k| !k.is_empty()) else {
      return Ok(None);
    };
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Some(Self {
      client,
      url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
      api_key,
      model: config.model.clone(),
      max_completion_tokens: config.max_completion_tokens,
    }))
  }
}

// ── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
  model:                 &'a str,
  messages:              [ChatMessage<'a>; 2],
  max_completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  content: Option<String>,
}

/// The first choice's text, or an empty string if the model returned none.
fn completion_text(response: ChatResponse) -> String {
  response
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .unwrap_or_default()
}

#[async_trait]
impl Advisor for OpenAiAdvisor {
  async fn advise(&self, farm: &Farm) -> Result<String, AdvisorError> {
    let prompt = user_prompt(farm);
    let body = ChatRequest {
      model:                 &self.model,
      messages:              [
        ChatMessage { role: "system", content: SYSTEM_PROMPT },
        ChatMessage { role: "user", content: &prompt },
      ],
      max_completion_tokens: self.max_completion_tokens,
    };

    let resp = self
      .client
      .post(&self.url)
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| AdvisorError::Request(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(AdvisorError::Status { status: status.as_u16(), body });
    }

    let parsed: ChatResponse = resp
      .json()
      .await
      .map_err(|e| AdvisorError::Malformed(e.to_string()))?;
    Ok(completion_text(parsed))
  }
}
