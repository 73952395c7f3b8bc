use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the Voxboard keyboard.
///
/// Loaded from `~/.voxboard/config.toml` by default. Each section covers one
/// component; all fields have defaults so a missing or partial file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoxboardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub recognition: RecognitionTimingConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

impl VoxboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VoxboardConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Timing and locale settings for the recognition session manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionTimingConfig {
    /// BCP-47 locale requested from the recognition engine.
    pub locale: String,
    /// Seconds before a proactive session restart. Must fire before the
    /// engine's own ~60 second auto-stop.
    pub watchdog_secs: u64,
    /// Milliseconds to settle between discarding a session and opening the
    /// next one.
    pub restart_settle_ms: u64,
    /// Milliseconds to wait before retrying after a recoverable network
    /// error.
    pub network_retry_ms: u64,
}

impl Default for RecognitionTimingConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            watchdog_secs: 55,
            restart_settle_ms: 100,
            network_retry_ms: 1000,
        }
    }
}

impl RecognitionTimingConfig {
    pub fn watchdog(&self) -> Duration {
        Duration::from_secs(self.watchdog_secs)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }

    pub fn network_retry(&self) -> Duration {
        Duration::from_millis(self.network_retry_ms)
    }
}

/// Auto-hide delays for the status reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Seconds an error message stays visible.
    pub error_hide_secs: u64,
    /// Seconds the stop confirmation stays visible.
    pub stop_hide_secs: u64,
    /// Milliseconds between fading a message and actually hiding it.
    pub fade_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            error_hide_secs: 3,
            stop_hide_secs: 2,
            fade_ms: 300,
        }
    }
}

impl StatusConfig {
    pub fn error_hide(&self) -> Duration {
        Duration::from_secs(self.error_hide_secs)
    }

    pub fn stop_hide(&self) -> Duration {
        Duration::from_secs(self.stop_hide_secs)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings_match_engine_limits() {
        let config = VoxboardConfig::default();
        // The watchdog must fire before the engine's ~60 second auto-stop.
        assert_eq!(config.recognition.watchdog_secs, 55);
        assert!(config.recognition.watchdog() < Duration::from_secs(60));
        assert_eq!(config.recognition.restart_settle(), Duration::from_millis(100));
        assert_eq!(config.recognition.network_retry(), Duration::from_millis(1000));
        assert_eq!(config.recognition.locale, "en-US");
    }

    #[test]
    fn test_default_status_delays() {
        let status = StatusConfig::default();
        assert_eq!(status.error_hide(), Duration::from_secs(3));
        assert_eq!(status.stop_hide(), Duration::from_secs(2));
        assert_eq!(status.fade(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_str = r#"
            [recognition]
            locale = "nl-NL"
        "#;
        let config: VoxboardConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.recognition.locale, "nl-NL");
        // Untouched fields keep their defaults.
        assert_eq!(config.recognition.watchdog_secs, 55);
        assert_eq!(config.status.fade_ms, 300);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: VoxboardConfig = toml::from_str("").unwrap();
        assert_eq!(config.recognition.watchdog_secs, 55);
        assert_eq!(config.status.error_hide_secs, 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = VoxboardConfig::default();
        config.recognition.watchdog_secs = 40;
        config.status.stop_hide_secs = 5;
        config.save(&path).unwrap();

        let loaded = VoxboardConfig::load(&path).unwrap();
        assert_eq!(loaded.recognition.watchdog_secs, 40);
        assert_eq!(loaded.status.stop_hide_secs, 5);
        assert_eq!(loaded.recognition.locale, "en-US");
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = VoxboardConfig::load_or_default(&path);
        assert_eq!(config.recognition.watchdog_secs, 55);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "recognition = [[[").unwrap();
        assert!(VoxboardConfig::load(&path).is_err());
    }
}
