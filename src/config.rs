//! Configuration management for reelplay
//!
//! Handles config file loading/saving and player tuning.
//! Config is stored at ~/.config/reelplay/config.toml

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::player::PlayerConfig;

const DEFAULT_AUTO_HIDE_MS: u64 = 4000;
const DEFAULT_SKIP_MS: u64 = 10_000;
const DEFAULT_SIM_DURATION_SECS: u64 = 600;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Idle time before controls hide while playing (ms)
    pub auto_hide_ms: Option<u64>,
    /// Skip forward/backward jump (ms)
    pub skip_ms: Option<u64>,
    /// Start playing as soon as a locator loads
    pub autoplay: Option<bool>,
    /// Episode server used when a catalog file lists several
    pub default_server: Option<usize>,
    /// Media length reported by the simulated decoder (seconds)
    pub sim_duration_secs: Option<u64>,
}

impl Config {
    /// Get config file path (~/.config/reelplay/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reelplay").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found
    pub fn load() -> Self {
        Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default()
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&path)
    }

    /// Save config to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Copy with every unset key filled with its default
    pub fn with_defaults(&self) -> Self {
        Self {
            auto_hide_ms: Some(self.auto_hide_ms()),
            skip_ms: Some(self.skip_ms()),
            autoplay: Some(self.autoplay()),
            default_server: Some(self.default_server()),
            sim_duration_secs: Some(self.sim_duration_secs()),
        }
    }

    pub fn auto_hide_ms(&self) -> u64 {
        self.auto_hide_ms.unwrap_or(DEFAULT_AUTO_HIDE_MS)
    }

    pub fn skip_ms(&self) -> u64 {
        self.skip_ms.unwrap_or(DEFAULT_SKIP_MS)
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay.unwrap_or(true)
    }

    pub fn default_server(&self) -> usize {
        self.default_server.unwrap_or(0)
    }

    pub fn sim_duration_secs(&self) -> u64 {
        self.sim_duration_secs.unwrap_or(DEFAULT_SIM_DURATION_SECS)
    }

    /// Controller tuning derived from this config
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            auto_hide_delay: Duration::from_millis(self.auto_hide_ms()),
            skip_interval_ms: self.skip_ms(),
            autoplay: self.autoplay(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.auto_hide_ms.is_none());
        assert_eq!(config.player_config(), PlayerConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str("auto_hide_ms = 2500\nautoplay = false\n").unwrap();
        let player = config.player_config();
        assert_eq!(player.auto_hide_delay, Duration::from_millis(2500));
        assert_eq!(player.skip_interval_ms, 10_000);
        assert!(!player.autoplay);
    }

    #[test]
    fn test_save_and_load_roundtrip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            skip_ms: Some(15_000),
            default_server: Some(1),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_with_defaults_fills_everything() {
        let filled = Config::default().with_defaults();
        assert_eq!(filled.auto_hide_ms, Some(4000));
        assert_eq!(filled.skip_ms, Some(10_000));
        assert_eq!(filled.autoplay, Some(true));
        assert_eq!(filled.default_server, Some(0));
        assert_eq!(filled.sim_duration_secs, Some(600));
    }
}
