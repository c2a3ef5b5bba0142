//! Task tracker server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) and `TASKTRACK_*`
//! environment variables, opens the SQLite store, and serves the JSON API
//! over HTTP.
//!
//! # Local tokens
//!
//! Bearer tokens are JWTs checked against `identity_public_key_file`. Without
//! a real identity provider, generate an Ed25519 keypair, point
//! `identity_public_key_file` at the `.pub.pem` half, and mint tokens with
//! the private half:
//!
//! ```text
//! cargo run -p tasktrack-server --bin server -- --generate-keypair dev
//! cargo run -p tasktrack-server --bin server -- \
//!   --mint-token uid-123 --signing-key dev.pem
//! ```

mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use tasktrack_api::{AppState, token};
use tasktrack_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Task tracker API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Write a new Ed25519 keypair to PREFIX.pem and PREFIX.pub.pem and exit.
  #[arg(long, value_name = "PREFIX")]
  generate_keypair: Option<String>,

  /// Print a bearer token for SUBJECT and exit.
  #[arg(long, value_name = "SUBJECT", requires = "signing_key")]
  mint_token: Option<String>,

  /// PKCS#8 PEM private key used by `--mint-token`.
  #[arg(long, value_name = "PATH")]
  signing_key: Option<PathBuf>,

  /// Lifetime of a minted token.
  #[arg(long, default_value_t = 3600)]
  ttl_secs: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper modes.
  if let Some(prefix) = cli.generate_keypair {
    return write_keypair(&prefix);
  }
  if let Some(subject) = cli.mint_token {
    let path = cli.signing_key.context("--signing-key is required")?;
    let pem = read_pem(&path)?;
    let key = token::encoding_key_from_pem(&pem)
      .with_context(|| format!("invalid signing key in {path:?}"))?;
    let token = token::mint(
      &key,
      &subject,
      chrono::Utc::now(),
      chrono::Duration::seconds(cli.ttl_secs),
    )?;
    println!("{token}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)?;

  let key_path = server_cfg.resolved_public_key_path();
  let mut identity = token::JwtVerifier::from_pem(
    server_cfg.identity_algorithm,
    &read_pem(&key_path)?,
    server_cfg.token_leeway_secs,
  )
  .with_context(|| format!("invalid identity public key in {key_path:?}"))?;
  if let Some(issuer) = &server_cfg.identity_issuer {
    identity = identity.with_issuer(issuer);
  }
  if let Some(audience) = &server_cfg.identity_audience {
    identity = identity.with_audience(audience);
  }

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open_with_timeout(
    &store_path,
    Duration::from_millis(server_cfg.busy_timeout_ms),
  )
  .await
  .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState {
    store:    Arc::new(store),
    identity: Arc::new(identity),
  };

  let app = tasktrack_api::router(state)
    .layer(cors_layer(&server_cfg.cors_allowed_origins)?)
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_pem(path: &Path) -> anyhow::Result<String> {
  std::fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))
}

/// Write `<prefix>.pem` (private, owner-only on Unix) and `<prefix>.pub.pem`.
fn write_keypair(prefix: &str) -> anyhow::Result<()> {
  let (private, public) = token::generate_keypair()?;

  let private_path = format!("{prefix}.pem");
  std::fs::write(&private_path, private)
    .with_context(|| format!("failed to write {private_path}"))?;
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(&private_path, std::fs::Permissions::from_mode(0o600))
      .with_context(|| format!("failed to restrict {private_path}"))?;
  }

  let public_path = format!("{prefix}.pub.pem");
  std::fs::write(&public_path, public)
    .with_context(|| format!("failed to write {public_path}"))?;

  println!("Generated Ed25519 keypair: {private_path}, {public_path}");
  Ok(())
}

/// Any origin when `origins` is empty, otherwise exactly those listed.
fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let allow_origin = if origins.is_empty() {
    AllowOrigin::from(Any)
  } else {
    let origins = origins
      .iter()
      .map(|o| {
        HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}"))
      })
      .collect::<anyhow::Result<Vec<_>>>()?;
    AllowOrigin::list(origins)
  };

  Ok(
    CorsLayer::new()
      .allow_origin(allow_origin)
      .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
      ])
      .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
  )
}
