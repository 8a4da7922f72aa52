//! roster-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! sheet store, and serves the registration API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an `[[operators]]` entry:
//!
//! ```
//! cargo run -p roster-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use roster_core::{geo::BoundaryIndex, sheet::SheetStore};
use roster_server::{AppState, ServerConfig};
use roster_store_sqlite::SqliteSheets;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster registration server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    println!("{}", prompt_and_hash()?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ROSTER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if server_cfg.operators.is_empty() {
    tracing::warn!("no operators configured; nobody can log in");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let sheets = SqliteSheets::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let boundary = match &server_cfg.boundary_path {
    Some(path) => Some(load_boundary(&expand_tilde(path), &server_cfg.boundary_name_property)?),
    None => None,
  };

  let state = AppState {
    store:     Arc::new(SheetStore::new(sheets, server_cfg.table_name.clone())),
    auth:      server_cfg.auth_state()?,
    reporting: Arc::new(server_cfg.reporting(boundary)?),
  };

  let app = roster_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(table = server_cfg.table_name.as_str(), "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read and index the municipal boundary document.
fn load_boundary(path: &Path, name_property: &str) -> anyhow::Result<BoundaryIndex> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read boundary document {path:?}"))?;
  let doc: serde_json::Value =
    serde_json::from_str(&raw).with_context(|| format!("{path:?} is not valid JSON"))?;
  let index = BoundaryIndex::from_document(&doc, name_property)?;
  tracing::info!(features = index.len(), "loaded boundary document");
  Ok(index)
}

/// Prompt on stderr, read one line from stdin, and return its argon2 PHC
/// string.
fn prompt_and_hash() -> anyhow::Result<String> {
  use std::io::Write as _;
  eprint!("Password: ");
  std::io::stderr().flush().ok();
  let mut line = String::new();
  std::io::stdin().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']);

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// Resolve a leading `~` against `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
