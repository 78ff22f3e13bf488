//! Browser engine configuration types.
//!
//! These types live here (always compiled) rather than behind
//! `#[cfg(feature = "browser")]` so that config parsing and serialization
//! work without the browser feature.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Browser engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserEngineConfig {
    /// Run in headless mode.
    /// Defaults to false so the final page can be inspected after a run.
    #[serde(default)]
    pub headless: bool,

    /// Explicit Chrome/Chromium executable. Searched for when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<PathBuf>,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// DevTools request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Window size as (width, height). The window starts maximised when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_size: Option<(u32, u32)>,

    /// Additional Chrome arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    /// Can also be set via BROWSER_URL environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: None,
            proxy: None,
            timeout: default_timeout(),
            window_size: None,
            chrome_args: Vec::new(),
            remote_url: None,
        }
    }
}

impl BrowserEngineConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `CHROME_PATH` - Chrome executable
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.is_empty() {
                self.remote_url = Some(val);
            }
        }

        if let Ok(val) = std::env::var("CHROME_PATH") {
            if !val.is_empty() {
                self.chrome_path = Some(PathBuf::from(val));
            }
        }

        self
    }
}

pub fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_engine_config_default() {
        let config = BrowserEngineConfig::default();
        assert!(!config.headless);
        assert!(config.proxy.is_none());
        assert_eq!(config.timeout, 30);
        assert!(config.window_size.is_none());
        assert!(config.chrome_args.is_empty());
        assert!(config.remote_url.is_none());
    }

    #[test]
    fn test_browser_engine_config_toml_with_values() {
        let toml_str = r#"
            headless = true
            proxy = "socks5://127.0.0.1:1080"
            timeout = 60
            window_size = [1920, 1080]
            chrome_args = ["--lang=en-IN"]
        "#;

        let config: BrowserEngineConfig = toml::from_str(toml_str).unwrap();
        assert!(config.headless);
        assert_eq!(config.proxy, Some("socks5://127.0.0.1:1080".to_string()));
        assert_eq!(config.timeout, 60);
        assert_eq!(config.window_size, Some((1920, 1080)));
        assert_eq!(config.chrome_args, vec!["--lang=en-IN"]);
    }

    #[test]
    fn test_browser_engine_config_empty_toml_uses_defaults() {
        let config: BrowserEngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, BrowserEngineConfig::default());
    }
}
