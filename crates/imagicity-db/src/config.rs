//! # Application Configuration
//!
//! Where the database lives and how the pool is sized.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     IMAGICITY_DB_PATH=/var/lib/imagicity/imagicity.db                  │
//! │     IMAGICITY_MAX_CONNECTIONS=8                                        │
//! │     IMAGICITY_INVOICE_PREFIX=INV-                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/imagicity/imagicity.toml (Linux)                         │
//! │     ~/Library/Application Support/in.imagicity.imagicity/... (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     imagicity.db in the platform data dir, 5 connections               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # imagicity.toml
//! [database]
//! path = "/srv/imagicity/imagicity.db"
//! max_connections = 5
//!
//! [numbering]
//! prefix = "IMAGI"   # used only when no numbering settings are stored yet
//! ```

use imagicity_core::validation::validate_prefix;
use imagicity_core::CoreError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

const CONFIG_FILE_NAME: &str = "imagicity.toml";
const DB_FILE_NAME: &str = "imagicity.db";

/// Database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Numbering bootstrap settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberingSettings {
    /// Prefix for a store that has never saved numbering settings.
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub numbering: NumberingSettings,
}

impl AppConfig {
    /// Loads configuration: defaults, then the TOML file, then environment.
    ///
    /// ## Arguments
    /// * `config_path` - Explicit file; falls back to the platform config dir
    pub fn load(config_path: Option<PathBuf>) -> DbResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml(contents: &str) -> DbResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DbResult<()> {
        if self.database.max_connections == 0 {
            return Err(DbError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if let Some(prefix) = &self.numbering.prefix {
            validate_prefix(prefix).map_err(CoreError::from)?;
        }

        Ok(())
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone()).max_connections(self.database.max_connections)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("IMAGICITY_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = lookup("IMAGICITY_MAX_CONNECTIONS") {
            if let Ok(parsed) = max.parse::<u32>() {
                self.database.max_connections = parsed;
            }
        }

        if let Some(prefix) = lookup("IMAGICITY_INVOICE_PREFIX") {
            self.numbering.prefix = Some(prefix);
        }
    }

    /// `imagicity.toml` in the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("in", "imagicity", "imagicity")
}

// =============================================================================
// Unit Tests
// =============================================================================
