//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Administrators allowed to manage events
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub user_ids: Vec<i64>,
}

/// Registration policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationConfig {
    /// Reject cancellations within `cancellation_cutoff_hours` of the start
    #[serde(default)]
    pub enforce_cancellation_cutoff: bool,
    #[serde(default = "default_cutoff_hours")]
    pub cancellation_cutoff_hours: u32,
}

/// Event management rules
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    #[serde(default = "default_max_capacity")]
    pub max_capacity: i32,
    /// Local offset used for calendar-day rules ("today", "this week")
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_acquire_timeout_seconds() -> u64 {
    30
}

fn default_file_prefix() -> String {
    "asakatsu.log".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_cutoff_hours() -> u32 {
    24
}

fn default_max_capacity() -> i32 {
    100
}

fn default_utc_offset_minutes() -> i32 {
    9 * 60
}

fn default_page_size() -> u32 {
    12
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            enforce_cancellation_cutoff: false,
            cancellation_cutoff_hours: default_cutoff_hours(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_max_capacity(),
            utc_offset_minutes: default_utc_offset_minutes(),
            page_size: default_page_size(),
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from the named file (extension optional) overlaid with
    /// `ASAKATSU__SECTION__KEY` environment variables
    pub fn from_file(name: &str) -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();
        let settings = config::Config::builder()
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.directory", defaults.logging.directory)?
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("ASAKATSU")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("admin.user_ids")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::AsakatsuError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/asakatsu".to_string(),
                max_connections: 10,
                min_connections: 1,
                acquire_timeout_seconds: default_acquire_timeout_seconds(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_prefix: default_file_prefix(),
                format: default_log_format(),
            },
            admin: AdminConfig::default(),
            registration: RegistrationConfig::default(),
            events: EventsConfig::default(),
        }
    }
}
