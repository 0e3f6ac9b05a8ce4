use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that supplies or overrides `catalog.url`.
pub const URL_ENV: &str = "CATALOG_ENRICH_URL";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub catalog: CatalogConfig,
  #[serde(default)]
  pub enrichment: EnrichmentConfig,
  #[serde(default)]
  pub status_cache: StatusCacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
  /// Base URL the `status` and `specs` endpoints live under
  pub url: Option<String>,
  #[serde(default = "default_request_timeout_ms")]
  pub request_timeout_ms: u64,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      url: None,
      request_timeout_ms: default_request_timeout_ms(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
  /// Fetch attempts per handle per surface
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
  /// Handles per spec request on surfaces that chunk
  #[serde(default = "default_batch_size")]
  pub batch_size: usize,
  #[serde(default = "default_fetch_timeout_ms")]
  pub fetch_timeout_ms: u64,
  /// Upper bound on waiting for idle before a deferred fetch fires anyway
  #[serde(default = "default_idle_timeout_ms")]
  pub idle_timeout_ms: u64,
  /// Delay used when the host has no idle signal
  #[serde(default = "default_fallback_delay_ms")]
  pub fallback_delay_ms: u64,
}

impl Default for EnrichmentConfig {
  fn default() -> Self {
    Self {
      max_attempts: default_max_attempts(),
      batch_size: default_batch_size(),
      fetch_timeout_ms: default_fetch_timeout_ms(),
      idle_timeout_ms: default_idle_timeout_ms(),
      fallback_delay_ms: default_fallback_delay_ms(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusCacheConfig {
  #[serde(default = "default_ttl_secs")]
  pub ttl_secs: i64,
}

impl Default for StatusCacheConfig {
  fn default() -> Self {
    Self {
      ttl_secs: default_ttl_secs(),
    }
  }
}

impl StatusCacheConfig {
  /// `ttl_secs` as a duration, or an error when it does not fit one.
  pub fn ttl(&self) -> Result<chrono::Duration> {
    if self.ttl_secs < 0 {
      return Err(eyre!("status_cache.ttl_secs must not be negative"));
    }
    chrono::Duration::try_seconds(self.ttl_secs)
      .ok_or_else(|| eyre!("status_cache.ttl_secs is too large: {}", self.ttl_secs))
  }
}

fn default_request_timeout_ms() -> u64 {
  8_000
}

fn default_max_attempts() -> u32 {
  2
}

fn default_batch_size() -> usize {
  40
}

fn default_fetch_timeout_ms() -> u64 {
  6_000
}

fn default_idle_timeout_ms() -> u64 {
  2_000
}

fn default_fallback_delay_ms() -> u64 {
  200
}

fn default_ttl_secs() -> i64 {
  300
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./catalog-enrich.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/catalog-enrich/config.yaml
  ///
  /// Without a file, defaults are used as long as a catalog URL comes from
  /// `url_override` or `CATALOG_ENRICH_URL`, which win over the file in
  /// that order.
  pub fn load(explicit_path: Option<&Path>, url_override: Option<String>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Some(url) = url_override.or_else(|| std::env::var(URL_ENV).ok()) {
      config.catalog.url = Some(url);
    }

    if config.catalog.url.is_none() {
      return Err(eyre!(
        "No catalog URL configured. Create ~/.config/catalog-enrich/config.yaml \
         with catalog.url, or set {}.",
        URL_ENV
      ));
    }

    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("catalog-enrich.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("catalog-enrich").join("config.yaml");
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

  pub fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    if self.enrichment.max_attempts == 0 {
      return Err(eyre!("enrichment.max_attempts must be at least 1"));
    }
    if self.enrichment.batch_size == 0 {
      return Err(eyre!("enrichment.batch_size must be at least 1"));
    }
    self.status_cache.ttl()?;
    Ok(())
  }

  pub fn catalog_url(&self) -> Option<&str> {
    self.catalog.url.as_deref()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_fill_missing_sections() {
    let config = Config::parse("catalog:\n  url: https://shop.example.com/api\n").unwrap();
    assert_eq!(config.catalog_url(), Some("https://shop.example.com/api"));
    assert_eq!(config.enrichment.max_attempts, 2);
    assert_eq!(config.enrichment.batch_size, 40);
    assert_eq!(config.status_cache.ttl_secs, 300);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn test_partial_section_keeps_other_defaults() {
    let config = Config::parse("enrichment:\n  batch_size: 10\n").unwrap();
    assert_eq!(config.enrichment.batch_size, 10);
    assert_eq!(config.enrichment.max_attempts, 2);
    assert_eq!(config.enrichment.fetch_timeout_ms, 6_000);
  }

  #[test]
  fn test_zero_attempts_rejected() {
    let config = Config::parse("enrichment:\n  max_attempts: 0\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_ttl_out_of_duration_range_rejected() {
    let config = Config::parse("status_cache:\n  ttl_secs: 9223372036854775807\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("too large"));
  }

  #[test]
  fn test_negative_ttl_rejected() {
    let config = Config::parse("status_cache:\n  ttl_secs: -1\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_ttl_converts_to_duration() {
    let config = Config::parse("status_cache:\n  ttl_secs: 120\n").unwrap();
    assert_eq!(config.status_cache.ttl().unwrap(), chrono::Duration::minutes(2));
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/nonexistent/catalog-enrich.yaml")), None).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
