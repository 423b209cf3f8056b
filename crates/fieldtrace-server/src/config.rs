//! Runtime configuration, read from an optional TOML file layered under
//! `FIELDTRACE__*` environment variables.
//!
//! ```toml
//! host           = "0.0.0.0"
//! port           = 5000
//! store_path     = "~/.local/share/fieldtrace/fieldtrace.db"
//! seed_demo_data = false
//!
//! [advisor]
//! api_key = "sk-..."
//! model   = "gpt-4o-mini"
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `FIELDTRACE__ADVISOR__API_KEY`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// Seed demo data into an empty database at startup.
  #[serde(default = "default_true")]
  pub seed_demo_data: bool,
  #[serde(default)]
  pub advisor:        AdvisorConfig,
}

/// Settings for the OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
  #[serde(default = "default_base_url")]
  pub base_url:              String,
  /// Without a key every generation request fails with a 500.
  pub api_key:               Option<String>,
  #[serde(default = "default_model")]
  pub model:                 String,
  #[serde(default = "default_max_completion_tokens")]
  pub max_completion_tokens: u32,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:          u64,
}

impl Default for AdvisorConfig {
  fn default() -> Self {
    Self {
      base_url:              default_base_url(),
      api_key:               None,
      model:                 default_model(),
      max_completion_tokens: default_max_completion_tokens(),
      timeout_secs:          default_timeout_secs(),
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("fieldtrace.db") }
fn default_true() -> bool { true }
fn default_base_url() -> String { "https://api.openai.com/v1".to_owned() }
fn default_model() -> String { "gpt-4o-mini".to_owned() }
fn default_max_completion_tokens() -> u32 { 200 }
fn default_timeout_secs() -> u64 { 30 }

impl ServerConfig {
  /// Read `path` (if it exists) and then the environment.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("FIELDTRACE")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  /// `store_path` with a leading `~/` expanded to `$HOME`.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
