//! Configuration management for streamplay
//!
//! Handles config file loading/saving and engine tuning.
//! Config is stored at ~/.config/streamplay/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::player::backend::Platform;

/// Environment override for the host platform ("native" / "web")
pub const PLATFORM_ENV: &str = "STREAMPLAY_PLATFORM";

/// Timing constants and platform for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on waiting for a seek to complete
    pub seek_settle_ms: u64,
    /// Interval between progress reports to the host
    pub progress_interval_ms: u64,
    /// Controls auto-hide delay while playing
    pub controls_hide_ms: u64,
    /// Delay before the buffering indicator appears
    pub buffering_debounce_ms: u64,
    pub skip_forward_secs: f64,
    pub skip_back_secs: f64,
    pub platform: Platform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seek_settle_ms: 300,
            progress_interval_ms: 5000,
            controls_hide_ms: 3000,
            buffering_debounce_ms: 500,
            skip_forward_secs: 30.0,
            skip_back_secs: 10.0,
            platform: Platform::Native,
        }
    }
}

impl EngineConfig {
    pub fn seek_settle(&self) -> Duration {
        Duration::from_millis(self.seek_settle_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    pub fn controls_hide(&self) -> Duration {
        Duration::from_millis(self.controls_hide_ms)
    }

    pub fn buffering_debounce(&self) -> Duration {
        Duration::from_millis(self.buffering_debounce_ms)
    }
}

/// Custom subtitle provider settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// Base URL of the OpenSubtitles-style download API
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    /// Disable the on-disk subtitle cache
    pub no_cache: bool,
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub subtitles: SubtitleConfig,
}

impl Config {
    /// Get config file path (~/.config/streamplay/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("streamplay").join("config.toml"))
    }

    /// Load config from the default path, or defaults if not found
    pub fn load() -> Self {
        let config: Config = Self::path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default();
        config.with_env()
    }

    /// Load config from an explicit file; unlike `load`, errors are reported
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config.with_env())
    }

    /// Apply environment overrides
    fn with_env(mut self) -> Self {
        if let Some(platform) = std::env::var(PLATFORM_ENV)
            .ok()
            .and_then(|v| Platform::from_name(&v))
        {
            self.engine.platform = platform;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.engine.seek_settle(), Duration::from_millis(300));
        assert_eq!(config.engine.skip_forward_secs, 30.0);
        assert_eq!(config.engine.skip_back_secs, 10.0);
        assert_eq!(config.engine.platform, Platform::Native);
        assert!(config.subtitles.api_base.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [engine]
            seek_settle_ms = 500
            platform = "web"

            [subtitles]
            api_base = "https://api.opensubtitles.com/api/v1"
            "#,
        )
        .unwrap();
        assert_eq!(config.engine.seek_settle_ms, 500);
        assert_eq!(config.engine.platform, Platform::Web);
        assert_eq!(config.engine.progress_interval_ms, 5000);
        assert!(!config.subtitles.no_cache);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        assert!(Config::load_from(Path::new("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn test_load_never_fails() {
        // Missing or unreadable files fall back to defaults
        let config = Config::load();
        assert!(config.engine.skip_forward_secs.is_finite());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = Config::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed, config);
    }
}
