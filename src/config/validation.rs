//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{AsakatsuError, Result};

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_FORMATS: [&str; 2] = ["pretty", "json"];

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_events_config(&settings.events)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(AsakatsuError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(AsakatsuError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(AsakatsuError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    if config.acquire_timeout_seconds == 0 {
        return Err(AsakatsuError::Config(
            "Acquire timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(AsakatsuError::Config(
            "Log level is required".to_string()
        ));
    }

    if !VALID_LEVELS.contains(&config.level.as_str()) {
        return Err(AsakatsuError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, VALID_LEVELS)
        ));
    }

    if !VALID_FORMATS.contains(&config.format.as_str()) {
        return Err(AsakatsuError::Config(
            format!("Invalid log format: {}. Valid formats: {:?}", config.format, VALID_FORMATS)
        ));
    }

    if config.directory.is_empty() {
        return Err(AsakatsuError::Config(
            "Log directory is required".to_string()
        ));
    }

    Ok(())
}

/// Validate event rules
fn validate_events_config(config: &super::EventsConfig) -> Result<()> {
    if config.max_capacity < 1 {
        return Err(AsakatsuError::Config(
            "Max event capacity must be at least 1".to_string()
        ));
    }

    // chrono::FixedOffset accepts strictly less than a day either way
    if config.utc_offset_minutes.abs() >= 24 * 60 {
        return Err(AsakatsuError::Config(
            format!("UTC offset out of range: {} minutes", config.utc_offset_minutes)
        ));
    }

    if config.page_size == 0 {
        return Err(AsakatsuError::Config(
            "Page size must be greater than 0".to_string()
        ));
    }

    Ok(())
}
