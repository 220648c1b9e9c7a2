use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Feed published by the catalog maintainers
pub const DEFAULT_FEED_URL: &str =
  "https://duet-public-content.s3.us-east-2.amazonaws.com/project.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub feed: FeedConfig,
  #[serde(default)]
  pub http: HttpConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
  #[serde(default = "default_feed_url")]
  pub url: String,
}

impl Default for FeedConfig {
  fn default() -> Self {
    Self {
      url: default_feed_url(),
    }
  }
}

fn default_feed_url() -> String {
  DEFAULT_FEED_URL.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
  #[serde(default = "default_user_agent")]
  pub user_agent: String,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      user_agent: default_user_agent(),
    }
  }
}

fn default_user_agent() -> String {
  concat!("starcats/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
  /// SQLite file that survives restarts
  #[default]
  Sqlite,
  /// In-process map, gone on exit
  Memory,
  /// No caching; every miss is final
  Off,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub mode: CacheMode,
  /// Override for the SQLite file (default: $XDG_DATA_HOME/starcats/cache.db)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
  /// Filter directive used when STARCATS_LOG is unset
  #[serde(default = "default_log_level")]
  pub level: String,
  /// Override for the log file (default: $XDG_DATA_HOME/starcats/starcats.log)
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: default_log_level(),
      file: None,
    }
  }
}

fn default_log_level() -> String {
  "info".to_string()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./starcats.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/starcats/config.yaml
  ///
  /// With no file found, defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("starcats.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("starcats").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a null document, which means "all defaults"
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }
}

/// Directory for the cache database and log file.
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("starcats"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::parse("").unwrap();
    assert_eq!(config.feed.url, DEFAULT_FEED_URL);
    assert_eq!(config.cache.mode, CacheMode::Sqlite);
    assert_eq!(config.log.level, "info");
    assert!(config.http.user_agent.starts_with("starcats/"));
  }

  #[test]
  fn test_partial_file_keeps_other_defaults() {
    let config = Config::parse(
      r#"
cache:
  mode: memory
log:
  level: debug
"#,
    )
    .unwrap();
    assert_eq!(config.cache.mode, CacheMode::Memory);
    assert_eq!(config.cache.path, None);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.feed.url, DEFAULT_FEED_URL);
  }

  #[test]
  fn test_full_file() {
    let config = Config::parse(
      r#"
feed:
  url: http://localhost:8000/project.json
http:
  user_agent: tester
cache:
  mode: off
  path: /tmp/cats.db
log:
  level: warn
  file: /tmp/cats.log
"#,
    )
    .unwrap();
    assert_eq!(config.feed.url, "http://localhost:8000/project.json");
    assert_eq!(config.http.user_agent, "tester");
    assert_eq!(config.cache.mode, CacheMode::Off);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/cats.db")));
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.log.file, Some(PathBuf::from("/tmp/cats.log")));
  }

  #[test]
  fn test_unknown_cache_mode_rejected() {
    assert!(Config::parse("cache:\n  mode: redis\n").is_err());
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
  }

  #[test]
  fn test_load_from_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("starcats.yaml");
    std::fs::write(&path, "feed:\n  url: http://x/feed.json\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.feed.url, "http://x/feed.json");
  }
}
