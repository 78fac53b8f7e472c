use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{BatchdubError, Result};

// Default values for progress feedback configuration
fn default_tick_interval_ms() -> u64 {
    300
}

fn default_ceiling() -> f64 {
    120.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Translation engine endpoint URL
    pub endpoint: String,
    /// Request timeout in seconds for a full batch call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Interval between synthesized progress increments (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Deceleration ceiling for the increment curve. Increments shrink
    /// proportionally to (1 - current/ceiling); values above 100 keep the
    /// curve from stalling near the top.
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                endpoint: "http://localhost:8750".to_string(),
                timeout_secs: 1800,
            },
            progress: ProgressConfig {
                tick_interval_ms: default_tick_interval_ms(),
                ceiling: default_ceiling(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BatchdubError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| BatchdubError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BatchdubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| BatchdubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.engine.endpoint, config.engine.endpoint);
        assert_eq!(parsed.progress.tick_interval_ms, 300);
    }

    #[test]
    fn test_progress_defaults_apply() {
        let parsed: Config = toml::from_str(
            "[engine]\nendpoint = \"http://engine:9000\"\ntimeout_secs = 60\n\n[progress]\n",
        )
        .unwrap();
        assert_eq!(parsed.progress.tick_interval_ms, 300);
        assert_eq!(parsed.progress.ceiling, 120.0);
    }
}
