//! Process-level configuration for the Snipper server binary.
//!
//! Values are layered by the `config` crate: an optional TOML file first,
//! then `SNIPPER_*` environment variables. Everything except
//! `token_secret` has a default.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_database_path() -> PathBuf { PathBuf::from("~/.local/share/snipper/snipper.db") }

fn default_access_ttl() -> u64 { 24 * 60 * 60 }

fn default_refresh_ttl() -> u64 { 7 * 24 * 60 * 60 }

fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_database_path")]
  pub database_path:          PathBuf,
  /// HMAC key for bearer tokens; at least 32 bytes.
  pub token_secret:           String,
  #[serde(default = "default_access_ttl")]
  pub access_token_ttl_secs:  u64,
  #[serde(default = "default_refresh_ttl")]
  pub refresh_token_ttl_secs: u64,
  #[serde(default = "default_true")]
  pub cors_allow_any_origin:  bool,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }

  pub fn access_token_ttl(&self) -> Duration { secs(self.access_token_ttl_secs) }

  pub fn refresh_token_ttl(&self) -> Duration { secs(self.refresh_token_ttl_secs) }
}

/// Absurd TTLs are capped at a century so expiry arithmetic cannot overflow.
fn secs(n: u64) -> Duration {
  let century = Duration::days(36_525);
  i64::try_from(n)
    .ok()
    .and_then(Duration::try_seconds)
    .map_or(century, |d| d.min(century))
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
