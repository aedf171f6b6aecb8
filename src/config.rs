//! Runtime configuration.
//!
//! Settings are layered: built-in defaults, then an optional config file,
//! then `AIRWATCH_`-prefixed environment variables, with command-line flags
//! applied on top by the binary.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::DEFAULT_WINDOW_CAPACITY;

/// Default serial baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
/// Default snapshot cadence in milliseconds.
pub const DEFAULT_TICK_PERIOD_MS: u64 = 1000;
/// Default ingestion poll interval when no bytes are waiting.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20;
/// Default serial read timeout.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 100;

/// Monitor settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Serial port identifier (e.g. `/dev/ttyUSB0`, `COM3`). Required for
    /// live monitoring; resolved from the CLI or a config file.
    pub port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Samples retained per metric.
    pub window_capacity: usize,
    /// Snapshot cadence in milliseconds.
    pub tick_period_ms: u64,
    /// How long the ingestion loop sleeps when no bytes are waiting.
    pub poll_interval_ms: u64,
    /// Serial read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Cap on a single input line before it is discarded as garbage.
    pub max_line_len: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            max_line_len: crate::framer::DEFAULT_MAX_LINE,
        }
    }
}

impl MonitorConfig {
    /// Load settings from an optional config file and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("AIRWATCH"))
            .build()
            .context("failed to load configuration")?;

        config
            .try_deserialize()
            .context("invalid configuration values")
    }

    /// Snapshot cadence as a [`Duration`].
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms.max(1))
    }

    /// Ingestion idle-poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Serial read timeout as a [`Duration`].
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.window_capacity, 1500);
        assert_eq!(config.tick_period(), Duration::from_secs(1));
        assert!(config.port.is_none());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = MonitorConfig::load(None).unwrap();
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.max_line_len, crate::framer::DEFAULT_MAX_LINE);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = \"/dev/ttyACM0\"").unwrap();
        writeln!(file, "baud_rate = 9600").unwrap();
        writeln!(file, "tick_period_ms = 250").unwrap();
        file.flush().unwrap();

        let config = MonitorConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.tick_period(), Duration::from_millis(250));
        // Unspecified keys keep their defaults.
        assert_eq!(config.window_capacity, 1500);
    }

    #[test]
    fn test_zero_periods_clamped() {
        let config = MonitorConfig {
            tick_period_ms: 0,
            poll_interval_ms: 0,
            ..MonitorConfig::default()
        };
        assert_eq!(config.tick_period(), Duration::from_millis(1));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }
}
