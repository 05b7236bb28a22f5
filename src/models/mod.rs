//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod registration;
pub mod user;

// Re-export commonly used models
pub use event::{Event, EventPhase, EventAvailability, CreateEventRequest, UpdateEventRequest, EventFilter, DateFilter, FeeRange, EventListQuery, EventPage};
pub use registration::{RegistrationStatus, EventRegistration, RegisteredEvent, Admission, ApplicationSnapshot, CancellationPolicy, CancellationSnapshot};
pub use user::{User, CreateUserRequest};
