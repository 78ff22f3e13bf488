//! Configuration management for firharvest.
//!
//! Settings come from a TOML file, then environment overrides, then CLI
//! flags (applied by the command that needs them). Without `--config` the
//! file is discovered by `prefer` under the name `firharvest`.

pub mod browser;
pub mod scrape;

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::ocr::OcrConfig;
use crate::portal::SearchCriteria;

pub use browser::BrowserEngineConfig;
pub use scrape::{ScrapeConfig, SelectionMode, Timings, DEFAULT_MAX_ATTEMPTS, DEFAULT_PORTAL_URL};

/// Name `prefer` discovers config files under.
pub const CONFIG_NAME: &str = "firharvest";

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub search: SearchCriteria,
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub browser: BrowserEngineConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Parse a config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Load the explicit file if given, else the one `prefer` discovers,
    /// else defaults. Environment overrides are applied last.
    pub async fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover().await {
                Some(path) => {
                    tracing::debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        Ok(config.with_env_overrides())
    }

    /// Config file found in the standard locations, if any.
    pub async fn discover() -> Option<PathBuf> {
        match prefer::load(CONFIG_NAME).await {
            Ok(found) => found.source_path().map(|p| p.to_path_buf()),
            Err(_) => None,
        }
    }

    /// Apply environment variable overrides.
    ///
    /// - `FIRHARVEST_DOWNLOAD_DIR` - download directory
    /// - `BROWSER_URL`, `CHROME_PATH` - see [`BrowserEngineConfig::with_env_overrides`]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("FIRHARVEST_DOWNLOAD_DIR") {
            if !val.is_empty() {
                self.scrape.download_dir = PathBuf::from(val);
            }
        }
        self.browser = self.browser.with_env_overrides();
        self
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_reference_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.search.district, "THANE CITY");
        assert_eq!(config.search.police_station, "NAUPADA");
        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.scrape.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.ocr.language, "mar+eng");
        assert_eq!(config.ocr.dpi, 200);
    }

    #[test]
    fn from_file_reads_all_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("firharvest.toml");
        std::fs::write(
            &path,
            r#"
            [search]
            date_from = "01/01/2025"
            date_to = "31/01/2025"
            district = "PUNE CITY"
            police_station = "SHIVAJINAGAR"

            [scrape]
            max_attempts = 2
            download_dir = "/tmp/firs"
            leave_open = false

            [browser]
            headless = true

            [ocr]
            dpi = 300
            "#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.search.district, "PUNE CITY");
        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.scrape.max_attempts, 2);
        assert_eq!(config.scrape.download_dir, PathBuf::from("/tmp/firs"));
        assert!(!config.scrape.leave_open);
        assert!(config.browser.headless);
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.ocr.language, "mar+eng");
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("firharvest.toml");
        std::fs::write(&path, "[scrape\nmax_attempts = ").unwrap();
        assert!(Config::from_file(&path).is_err());
    }

    #[tokio::test]
    async fn explicit_file_wins_over_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[scrape]\nmax_attempts = 9\n").unwrap();

        let config = Config::load(Some(&path)).await.unwrap();
        assert_eq!(config.scrape.max_attempts, 9);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Config::load(Some(&missing)).await.is_err());
    }

    #[test]
    fn serialized_config_parses_back() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
