use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub notifications: NotificationsConfig,
  #[serde(default)]
  pub behavior: BehaviorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the admin REST API, e.g. `https://admin.example.test/api/v1`
  pub base_url: String,
  /// Request timeout in seconds (default: 30)
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Freshness window in seconds (default: 300)
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: u64,
  /// Persist the cache to disk between runs (default: false, in-memory only)
  #[serde(default)]
  pub persist: bool,
  /// Override for the persistent cache location
  #[serde(default)]
  pub path: Option<PathBuf>,
  /// Coalesce concurrent fetches of the same resource (default: false,
  /// concurrent fetches each hit the network and the last write wins)
  #[serde(default)]
  pub dedup_inflight: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
  /// Display duration for notifications in milliseconds (default: 5000)
  #[serde(default = "default_duration_ms")]
  pub default_duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorConfig {
  /// Abort in-flight requests when their query is dropped or refetched
  /// (default: false, the request runs to completion and is discarded)
  #[serde(default)]
  pub cancel_on_drop: bool,
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_ttl_secs() -> u64 {
  300
}

fn default_duration_ms() -> u64 {
  5000
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
      persist: false,
      path: None,
      dedup_inflight: false,
    }
  }
}

impl Default for NotificationsConfig {
  fn default() -> Self {
    Self {
      default_duration_ms: default_duration_ms(),
    }
  }
}

impl Default for BehaviorConfig {
  fn default() -> Self {
    Self {
      cancel_on_drop: false,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./souk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/souk/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(Error::Config(format!(
          "config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(Error::Config(
        "no configuration file found; create one at ~/.config/souk/config.yaml".to_string(),
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("souk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("souk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      Error::Config(format!(
        "failed to read config file {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_yaml(&contents).map_err(|e| {
      Error::Config(format!(
        "failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })
  }

  /// Parse configuration from a YAML string.
  pub fn from_yaml(contents: &str) -> Result<Self> {
    serde_yaml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
  }

  /// Get the admin API token from environment variables.
  ///
  /// Checks SOUK_ADMIN_TOKEN first, then SOUK_API_TOKEN as fallback.
  /// Returns None when neither is set; development setups running against
  /// the in-memory backend don't need one.
  pub fn api_token() -> Option<String> {
    std::env::var("SOUK_ADMIN_TOKEN")
      .or_else(|_| std::env::var("SOUK_API_TOKEN"))
      .ok()
  }

  /// TTL as a chrono duration for the cache layer.
  pub fn cache_ttl(&self) -> chrono::Duration {
    chrono::Duration::seconds(self.cache.ttl_secs as i64)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_defaults() {
    let config = Config::from_yaml(
      r#"
api:
  base_url: https://admin.example.test/api/v1
"#,
    )
    .expect("parse");

    assert_eq!(config.api.base_url, "https://admin.example.test/api/v1");
    assert_eq!(config.api.timeout_secs, 30);
    assert_eq!(config.cache.ttl_secs, 300);
    assert!(!config.cache.persist);
    assert!(!config.cache.dedup_inflight);
    assert_eq!(config.notifications.default_duration_ms, 5000);
    assert!(!config.behavior.cancel_on_drop);
  }

  #[test]
  fn test_full_config_overrides() {
    let config = Config::from_yaml(
      r#"
api:
  base_url: http://localhost:8080/api
  timeout_secs: 5
cache:
  ttl_secs: 60
  persist: true
  path: /tmp/souk-cache.db
  dedup_inflight: true
notifications:
  default_duration_ms: 2500
behavior:
  cancel_on_drop: true
"#,
    )
    .expect("parse");

    assert_eq!(config.api.timeout_secs, 5);
    assert_eq!(config.cache.ttl_secs, 60);
    assert!(config.cache.persist);
    assert_eq!(
      config.cache.path.as_deref(),
      Some(Path::new("/tmp/souk-cache.db"))
    );
    assert!(config.cache.dedup_inflight);
    assert_eq!(config.notifications.default_duration_ms, 2500);
    assert!(config.behavior.cancel_on_drop);
  }

  #[test]
  fn test_missing_api_section_is_an_error() {
    assert!(Config::from_yaml("cache:\n  ttl_secs: 10\n").is_err());
  }
}
