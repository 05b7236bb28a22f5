//! Error handling for Asakatsu
//!
//! This module defines the main error types used throughout the application.
//! Infrastructure faults live in [`AsakatsuError`]; the expected outcomes of
//! applying to or cancelling an event live in [`RegistrationError`] and
//! [`CancellationError`], which wrap infrastructure faults in a separate
//! `Storage` variant so callers can tell the two apart.

use thiserror::Error;

/// Main error type for Asakatsu application
#[derive(Error, Debug)]
pub enum AsakatsuError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for AsakatsuError {
    fn from(err: config::ConfigError) -> Self {
        AsakatsuError::Config(err.to_string())
    }
}

/// Outcome of a rejected event application
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Event not found: {event_id}")]
    NotFound { event_id: i64 },

    #[error("Event {event_id} has already finished")]
    EventFinished { event_id: i64 },

    #[error("Event {event_id} is full (capacity {capacity})")]
    EventFull { event_id: i64, capacity: i32 },

    #[error("User {user_id} is already registered for event {event_id}")]
    AlreadyRegistered { event_id: i64, user_id: i64 },

    #[error("Storage failure: {0}")]
    Storage(#[from] AsakatsuError),
}

/// Outcome of a rejected cancellation
#[derive(Error, Debug)]
pub enum CancellationError {
    #[error("User {user_id} has no active registration for event {event_id}")]
    NotRegistered { event_id: i64, user_id: i64 },

    #[error("Cancellation for event {event_id} closed {cutoff_hours} hours before start")]
    CutoffPassed { event_id: i64, cutoff_hours: u32 },

    #[error("Storage failure: {0}")]
    Storage(#[from] AsakatsuError),
}

impl From<sqlx::Error> for RegistrationError {
    fn from(err: sqlx::Error) -> Self {
        RegistrationError::Storage(AsakatsuError::Database(err))
    }
}

impl From<sqlx::Error> for CancellationError {
    fn from(err: sqlx::Error) -> Self {
        CancellationError::Storage(AsakatsuError::Database(err))
    }
}

impl RegistrationError {
    /// True for the expected outcomes, false for infrastructure faults
    pub fn is_domain(&self) -> bool {
        !matches!(self, RegistrationError::Storage(_))
    }

    /// Message shown to the applicant
    pub fn user_message(&self) -> &'static str {
        match self {
            RegistrationError::NotFound { .. } => "This event could not be found.",
            RegistrationError::EventFinished { .. } => "This event has already finished.",
            RegistrationError::EventFull { .. } => "This event is full and no longer accepts applications.",
            RegistrationError::AlreadyRegistered { .. } => "You have already applied to this event.",
            RegistrationError::Storage(_) => "Something went wrong. Please try again later.",
        }
    }
}

impl CancellationError {
    /// True for the expected outcomes, false for infrastructure faults
    pub fn is_domain(&self) -> bool {
        !matches!(self, CancellationError::Storage(_))
    }

    /// Message shown to the participant
    pub fn user_message(&self) -> &'static str {
        match self {
            CancellationError::NotRegistered { .. } => "You are not registered for this event.",
            CancellationError::CutoffPassed { .. } => "Cancellations are no longer accepted for this event.",
            CancellationError::Storage(_) => "Something went wrong. Please try again later.",
        }
    }
}

/// Result type alias for Asakatsu operations
pub type Result<T> = std::result::Result<T, AsakatsuError>;

impl AsakatsuError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            AsakatsuError::Database(_) => false,
            AsakatsuError::Migration(_) => false,
            AsakatsuError::Config(_) => false,
            AsakatsuError::PermissionDenied(_) => false,
            AsakatsuError::UserNotFound { .. } => false,
            AsakatsuError::EventNotFound { .. } => false,
            AsakatsuError::InvalidStateTransition { .. } => false,
            AsakatsuError::InvalidInput(_) => false,
            AsakatsuError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AsakatsuError::Database(_) => ErrorSeverity::Critical,
            AsakatsuError::Migration(_) => ErrorSeverity::Critical,
            AsakatsuError::Config(_) => ErrorSeverity::Critical,
            AsakatsuError::PermissionDenied(_) => ErrorSeverity::Warning,
            AsakatsuError::InvalidInput(_) => ErrorSeverity::Info,
            AsakatsuError::EventNotFound { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
