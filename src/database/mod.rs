//! Database module
//!
//! This module handles database connections, the storage traits the services
//! depend on, and their Postgres and in-memory implementations

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, health_check};
pub use memory::MemoryStore;
pub use repositories::{EventRepository, RegistrationRepository, UserRepository};
pub use service::DatabaseService;
pub use store::{EventStore, RegistrationStore};
