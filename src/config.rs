use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::Naming;

/// Floor for `poll_interval_ms`, keeps tmux from being polled in a tight loop
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// User settings read from `~/.cactus/config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sampling period. Values below `MIN_POLL_INTERVAL_MS` are raised to it.
    pub poll_interval_ms: u64,
    /// Trailing pane lines compared between polls
    pub capture_lines: usize,
    pub session_prefix: String,
    /// Typed into every new session
    pub launch_command: String,
    pub tmux_path: String,
    /// Dump every capture to `<data dir>/<name>_output.txt`
    pub export_captured: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2500,
            capture_lines: 8,
            session_prefix: "claude-".to_string(),
            launch_command: "claude".to_string(),
            tmux_path: "tmux".to_string(),
            export_captured: false,
        }
    }
}

impl Config {
    /// Read `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        if config.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            tracing::warn!(
                "poll_interval_ms = {} is below the minimum, using {}",
                config.poll_interval_ms,
                MIN_POLL_INTERVAL_MS
            );
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn naming(&self) -> Naming {
        Naming::new(self.session_prefix.clone())
    }
}

/// `~/.cactus`, home of config, logs and path history
pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".cactus")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "capture_lines = 12\nlaunch_command = \"claude --continue\"\n")
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.capture_lines, 12);
        assert_eq!(config.launch_command, "claude --continue");
        assert_eq!(config.session_prefix, "claude-");
    }

    #[test]
    fn test_poll_interval_floor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = 10\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.poll_interval(), Duration::from_millis(MIN_POLL_INTERVAL_MS));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "poll_interval_ms = \"soon\"").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
