//! Configuration file management.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use beacon_core::ConnectionConfig;
use serde::{Deserialize, Serialize};

/// Default scan timeout in seconds.
pub const DEFAULT_SCAN_TIMEOUT: u64 = 5;

/// Default connection timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 15;

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default device identifier
    #[serde(default)]
    pub device: Option<String>,

    /// Scan timeout in seconds
    #[serde(default)]
    pub scan_timeout: Option<u64>,

    /// Connection timeout in seconds
    #[serde(default)]
    pub connect_timeout: Option<u64>,

    /// Disable-sleep command as hex (defaults to "SLP0")
    #[serde(default)]
    pub disable_sleep_command: Option<String>,

    /// Device aliases (identifier -> unique name)
    #[serde(default)]
    pub aliases: HashMap<String, String>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("logger-beacon")
            .join("config.toml")
    }

    /// Load config from `path`, or return default if not found
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to `path`, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Scan timeout, with `flag` taking precedence over the file
    pub fn scan_timeout(&self, flag: Option<u64>) -> Duration {
        Duration::from_secs(
            flag.or(self.scan_timeout)
                .unwrap_or(DEFAULT_SCAN_TIMEOUT),
        )
    }

    /// Build the BLE connection settings
    pub fn connection_config(&self, timeout_flag: Option<u64>) -> Result<ConnectionConfig> {
        let connect_timeout = timeout_flag
            .or(self.connect_timeout)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        let mut config = ConnectionConfig::default()
            .connection_timeout(Duration::from_secs(connect_timeout))
            .scan_duration(self.scan_timeout(None));

        if let Some(hex) = &self.disable_sleep_command {
            let command = beacon_types::parse_hex(hex)
                .with_context(|| format!("Invalid disable_sleep_command '{}'", hex))?;
            config = config.disable_sleep_command(command);
        }
        Ok(config)
    }
}

/// Resolve device from flag or env var (already merged by clap), then config.
pub fn resolve_device(device: Option<String>, config: &Config) -> Option<String> {
    device
        .filter(|d| !d.is_empty())
        .or_else(|| config.device.clone())
}
