//! fieldtrace server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, optionally seeds demo data, and serves the JSON API over HTTP.
//!
//! # Accounts
//!
//! ```text
//! echo 's3cret' | fieldtrace add-user alice --role farmer
//! ```

use std::{io::BufRead, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use fieldtrace_api::{AppState, auth::hash_password};
use fieldtrace_core::{
  role::{NewUser, Role},
  store::FarmStore,
};
use fieldtrace_server::{advisor_from_config, config::ServerConfig, seed};
use fieldtrace_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Farm records and supply-chain traceability server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Run the HTTP server (the default).
  Serve,
  /// Print the argon2 hash for a password read from stdin.
  HashPassword,
  /// Create a user; the password is read from stdin.
  AddUser {
    username: String,
    /// farmer, processor, retailer, input_provider, financial_provider,
    /// regulator or consumer.
    #[arg(long)]
    role:     Role,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command.unwrap_or(Command::Serve) {
    Command::HashPassword => {
      let password = read_password()?;
      let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      println!("{hash}");
      Ok(())
    }
    Command::AddUser { username, role } => {
      let cfg = load_config(&cli.config)?;
      let store = open_store(&cfg).await?;
      let password = read_password()?;
      let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
      let user = store
        .add_user(NewUser {
          id: Uuid::new_v4().to_string(),
          username,
          role,
          password_hash,
        })
        .await
        .context("failed to add user")?;
      println!("{} {} {}", user.id, user.username, user.role);
      Ok(())
    }
    Command::Serve => serve(load_config(&cli.config)?).await,
  }
}

async fn serve(cfg: ServerConfig) -> anyhow::Result<()> {
  let store = Arc::new(open_store(&cfg).await?);

  if cfg.seed_demo_data {
    let store = Arc::clone(&store);
    tokio::spawn(async move {
      if let Err(e) = seed::seed_demo_data(store.as_ref()).await {
        tracing::error!(error = %e, "failed to seed demo data");
      }
    });
  }

  let advisor =
    advisor_from_config(&cfg.advisor).context("failed to build advisor HTTP client")?;
  let app = fieldtrace_api::api_router(AppState { store, advisor });

  let address = cfg.address();
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

fn load_config(path: &std::path::Path) -> anyhow::Result<ServerConfig> {
  ServerConfig::load(path).with_context(|| format!("failed to read config {path:?}"))
}

async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let path = cfg.resolved_store_path();
  SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

/// Read one line from stdin, without the trailing newline.
fn read_password() -> anyhow::Result<String> {
  let mut line = String::new();
  std::io::stdin()
    .lock()
    .read_line(&mut line)
    .context("failed to read password from stdin")?;
  let password = line.trim_end_matches(['\n', '\r']).to_owned();
  anyhow::ensure!(!password.is_empty(), "password must not be empty");
  Ok(password)
}
