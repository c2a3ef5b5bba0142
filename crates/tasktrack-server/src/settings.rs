//! Runtime configuration: `config.toml` layered under `TASKTRACK_*` env vars.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{
  Config, ConfigError, Environment, File,
  builder::{ConfigBuilder, DefaultState},
};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:                     String,
  pub port:                     u16,
  pub store_path:               PathBuf,
  pub busy_timeout_ms:          u64,
  /// PEM public key the identity provider signs tokens with.
  pub identity_public_key_file: PathBuf,
  pub identity_algorithm:       Algorithm,
  /// Required `iss` claim, if any.
  pub identity_issuer:          Option<String>,
  /// Required `aud` claim, if any.
  pub identity_audience:        Option<String>,
  pub token_leeway_secs:        u64,
  /// Empty allows any origin.
  pub cors_allowed_origins:     Vec<String>,
}

fn with_defaults(
  builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
  builder
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8000)?
    .set_default("store_path", "tasktrack.db")?
    .set_default("busy_timeout_ms", 5000)?
    .set_default("identity_algorithm", "EdDSA")?
    .set_default("token_leeway_secs", 30)?
    .set_default("cors_allowed_origins", Vec::<String>::new())
}

impl ServerConfig {
  /// Read `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = with_defaults(Config::builder())
      .context("invalid configuration defaults")?
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("TASKTRACK")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_allowed_origins"),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }

  /// `identity_public_key_file` with a leading `~` expanded.
  pub fn resolved_public_key_path(&self) -> PathBuf {
    expand_tilde(&self.identity_public_key_file)
  }
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
