//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::presence::DEFAULT_CAPACITY;
use crate::roster::ImportConfig;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "rollcall";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "roster.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Presence tracking configuration.
    pub presence: PresenceConfig,
    /// Roster import configuration.
    pub import: ImportSettings,
    /// Dashboard configuration.
    pub dashboard: DashboardConfig,
    /// Admin credential.
    pub admin: AdminConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/rollcall/roster.db`
    pub database_path: Option<PathBuf>,
}

/// Presence-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceConfig {
    /// Maximum number of people inside at once.
    pub capacity: usize,
    /// Whether scans of roster identifiers enforce the capacity.
    pub enforce_capacity_on_scan: bool,
}

/// Roster import configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// How many leading rows may hold the header.
    pub header_scan_rows: usize,
}

/// Dashboard configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Interval between refreshes in watch mode, in milliseconds.
    pub poll_interval_ms: u64,
}

/// Admin credential configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// The only email allowed to use admin commands.
    pub email: String,
    /// BLAKE3 hex digest of the admin password.
    /// Admin commands are refused while unset.
    pub password_hash: Option<String>,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            enforce_capacity_on_scan: true,
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        let defaults = ImportConfig::default();
        Self {
            header_scan_rows: defaults.header_scan_rows,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@employee.com".to_string(),
            password_hash: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ROLLCALL_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("ROLLCALL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.presence.capacity == 0 {
            return Err(Error::ConfigValidation {
                message: "presence.capacity must be greater than 0".to_string(),
            });
        }

        if self.import.header_scan_rows == 0 {
            return Err(Error::ConfigValidation {
                message: "import.header_scan_rows must be greater than 0".to_string(),
            });
        }

        if self.dashboard.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "dashboard.poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.admin.email.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "admin.email must not be empty".to_string(),
            });
        }

        if let Some(hash) = &self.admin.password_hash {
            if blake3::Hash::from_hex(hash.trim()).is_err() {
                return Err(Error::ConfigValidation {
                    message: "admin.password_hash is not a BLAKE3 hex digest".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the importer configuration.
    #[must_use]
    pub fn import_config(&self) -> ImportConfig {
        ImportConfig {
            header_scan_rows: self.import.header_scan_rows,
        }
    }

    /// Capacity applied to roster scans, if enforced.
    #[must_use]
    pub fn scan_capacity(&self) -> Option<usize> {
        self.presence
            .enforce_capacity_on_scan
            .then_some(self.presence.capacity)
    }

    /// Get the dashboard poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.dashboard.poll_interval_ms)
    }
}
