//! Asakatsu event registration
//!
//! Event listings and registration management for the Asakatsu morning
//! activity community: administrators publish events with a fixed capacity,
//! members apply and cancel, and the registration manager keeps the
//! confirmed count within capacity even under concurrent applications.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{AsakatsuError, CancellationError, RegistrationError, Result};

// Re-export main components for easy access
pub use database::{DatabaseService, EventStore, MemoryStore, RegistrationStore};
pub use services::{EventService, RegistrationManager, ServiceFactory};
pub use utils::clock::{Clock, ManualClock, SystemClock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
