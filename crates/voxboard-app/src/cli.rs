//! CLI argument definitions for the Voxboard application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Voxboard — a voice-enabled on-screen keyboard.
#[derive(Parser, Debug)]
#[command(name = "voxboard", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Recognition locale, e.g. en-US.
    #[arg(long = "locale")]
    pub locale: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Run without a speech engine (keyboard input only).
    #[arg(long = "no-engine")]
    pub no_engine: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > VOXBOARD_CONFIG env var > platform default
    /// (~/.voxboard/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("VOXBOARD_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the recognition locale.
    ///
    /// Priority: --locale flag > config file value.
    pub fn resolve_locale(&self, config_locale: &str) -> String {
        self.locale
            .clone()
            .unwrap_or_else(|| config_locale.to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > "info".
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".voxboard").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".voxboard").join("config.toml");
    }
    PathBuf::from("config.toml")
}
