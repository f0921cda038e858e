use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
  pub midday: MiddayConfig,
  pub cache: CacheConfig,
  pub timer: TimerConfig,
  /// Custom title for the header (defaults to the API host)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MiddayConfig {
  /// Base URL for the Midday REST API
  pub api_url: String,
  /// Global search endpoint. Kept separate from `api_url`: search goes
  /// through a raw request with a hand-attached bearer header, not the
  /// regular client plumbing.
  pub search_url: String,
  /// Page size for list endpoints
  pub page_size: u32,
}

impl Default for MiddayConfig {
  fn default() -> Self {
    Self {
      api_url: "https://api.midday.ai".to_string(),
      search_url: "https://api.midday.ai/search".to_string(),
      page_size: 100,
    }
  }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// How long a cached query result is considered fresh, in seconds
  pub fresh_secs: u64,
  /// How long an unused entry is kept before eviction, in seconds
  pub gc_secs: u64,
  /// Total fetch attempts before a failure surfaces to the view
  pub max_attempts: u32,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      fresh_secs: 30,
      gc_secs: 300,
      max_attempts: 3,
    }
  }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
  /// While a timer is tracking: seconds since the last observation
  /// before the server is polled again for ground truth
  pub tracking_refresh_secs: u64,
  /// While idle: seconds since the last check before polling whether a
  /// timer was started elsewhere
  pub idle_check_secs: u64,
}

impl Default for TimerConfig {
  fn default() -> Self {
    Self {
      tracking_refresh_secs: 60,
      idle_check_secs: 15 * 60,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./m9s.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/m9s/config.yaml
  ///
  /// Unlike the token, the config file is optional: every field has a
  /// sensible default, so a missing file yields `Config::default()`.
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
      None => Ok(Config::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("m9s.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("m9s").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Title shown in the header.
  pub fn display_title(&self) -> String {
    self.title.clone().unwrap_or_else(|| {
      url::Url::parse(&self.midday.api_url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| "midday".to_string())
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_policy() {
    let config = Config::default();
    assert_eq!(config.cache.fresh_secs, 30);
    assert_eq!(config.cache.gc_secs, 300);
    assert_eq!(config.cache.max_attempts, 3);
    assert_eq!(config.timer.tracking_refresh_secs, 60);
    assert_eq!(config.timer.idle_check_secs, 900);
    assert_eq!(config.midday.page_size, 100);
  }

  #[test]
  fn partial_yaml_keeps_defaults_elsewhere() {
    let config: Config = serde_yaml::from_str(
      "timer:\n  tracking_refresh_secs: 10\nmidday:\n  api_url: \"https://staging.midday.ai\"\n",
    )
    .unwrap();

    assert_eq!(config.timer.tracking_refresh_secs, 10);
    assert_eq!(config.timer.idle_check_secs, 900);
    assert_eq!(config.midday.api_url, "https://staging.midday.ai");
    assert_eq!(config.midday.search_url, "https://api.midday.ai/search");
    assert_eq!(config.display_title(), "staging.midday.ai");
  }
}
