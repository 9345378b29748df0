// src/config.rs - TOML configuration with serde defaults
//
// Every field has a default, so an absent file or an empty table still yields
// a working configuration.
//
// ```toml
// [batch]
// inter_file_delay_ms = 500
//
// [dispatch]
// gui_tool_timeout_secs = 60
// spooler_timeout_secs = 30
// ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::StrategyTimeouts;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Throttle between files, keeping the spooler from being flooded.
    #[serde(default = "default_inter_file_delay_ms")]
    pub inter_file_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            inter_file_delay_ms: default_inter_file_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Bound for GUI print tools (SumatraPDF, Adobe Reader, shell verb).
    #[serde(default = "default_gui_tool_timeout_secs")]
    pub gui_tool_timeout_secs: u64,
    /// Bound for command-line spooler clients (lp, lpr).
    #[serde(default = "default_spooler_timeout_secs")]
    pub spooler_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            gui_tool_timeout_secs: default_gui_tool_timeout_secs(),
            spooler_timeout_secs: default_spooler_timeout_secs(),
        }
    }
}

fn default_inter_file_delay_ms() -> u64 {
    500
}

fn default_gui_tool_timeout_secs() -> u64 {
    60
}

fn default_spooler_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn inter_file_delay(&self) -> Duration {
        Duration::from_millis(self.batch.inter_file_delay_ms)
    }

    pub fn strategy_timeouts(&self) -> StrategyTimeouts {
        StrategyTimeouts {
            gui_tool: Duration::from_secs(self.dispatch.gui_tool_timeout_secs),
            spooler: Duration::from_secs(self.dispatch.spooler_timeout_secs),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults. A malformed
/// file is still an error; silently ignoring it would mask typos.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.is_file() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.batch.inter_file_delay_ms, 500);
        assert_eq!(config.dispatch.gui_tool_timeout_secs, 60);
        assert_eq!(config.dispatch.spooler_timeout_secs, 30);
        assert_eq!(config.inter_file_delay(), Duration::from_millis(500));
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.batch.inter_file_delay_ms, 500);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str("[batch]\ninter_file_delay_ms = 100\n").unwrap();
        assert_eq!(config.batch.inter_file_delay_ms, 100);
        assert_eq!(config.dispatch.spooler_timeout_secs, 30);
    }

    #[test]
    fn timeouts_convert_to_durations() {
        let config: Config =
            toml::from_str("[dispatch]\ngui_tool_timeout_secs = 10\nspooler_timeout_secs = 5\n")
                .unwrap();
        let timeouts = config.strategy_timeouts();
        assert_eq!(timeouts.gui_tool, Duration::from_secs(10));
        assert_eq!(timeouts.spooler, Duration::from_secs(5));
    }
}
