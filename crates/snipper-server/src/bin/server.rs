//! snipper server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), overlays
//! `SNIPPER_*` environment variables, opens the SQLite database and serves
//! the JSON API under `/api`.
//!
//! # Token secret generation
//!
//! ```
//! cargo run -p snipper-server --bin server -- --generate-secret
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use rand_core::{OsRng, RngCore as _};
use snipper_api::{AppState, password::Argon2Hasher, token::TokenIssuer};
use snipper_server::ServerConfig;
use snipper_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Snipper code-snippet server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print a random 32-byte token secret as hex and exit.
  #[arg(long)]
  generate_secret: bool,
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

  if cli.generate_secret {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    println!("{}", hex::encode(secret));
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SNIPPER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let tokens = TokenIssuer::new(
    &server_cfg.token_secret,
    server_cfg.access_token_ttl(),
    server_cfg.refresh_token_ttl(),
  )
  .context("invalid token_secret")?;

  let db_path = server_cfg.database_path();
  if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open database at {db_path:?}"))?;

  let state = AppState::new(Arc::new(store), Argon2Hasher::default(), tokens);
  let app = snipper_api::app(state, server_cfg.cors_allow_any_origin);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}/api");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("shut down");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
