//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Asakatsu application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::utils::errors::{AsakatsuError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| AsakatsuError::Config(format!("Invalid log filter: {}", e)))?;
    let registry = tracing_subscriber::registry().with(filter);

    let initialized = if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stdout))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stdout))
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()
    };
    initialized.map_err(|e| AsakatsuError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration lifecycle actions
pub fn log_registration_action(event_id: i64, user_id: i64, action: &str, status: &str) {
    info!(
        event_id = event_id,
        user_id = user_id,
        action = action,
        status = status,
        "Registration action performed"
    );
}

/// Log a rejected registration or cancellation
pub fn log_registration_rejected(event_id: i64, user_id: i64, action: &str, reason: &str) {
    debug!(
        event_id = event_id,
        user_id = user_id,
        action = action,
        reason = reason,
        "Registration request rejected"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}
