//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod event;
pub mod registration;

// Re-export commonly used services
pub use auth::{AuthService, Permission};
pub use event::EventService;
pub use registration::RegistrationManager;

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::{EventStore, MemoryStore, RegistrationStore};
use crate::utils::clock::Clock;
use crate::utils::errors::Result;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub event_service: EventService,
    pub registration_manager: RegistrationManager,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(
        settings: &Settings,
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let auth_service = AuthService::new(&settings.admin);
        let event_service = EventService::new(events.clone(), auth_service.clone(), clock.clone(), &settings.events)?;
        let registration_manager = RegistrationManager::new(events, registrations, clock, &settings.registration);

        Ok(Self {
            auth_service,
            event_service,
            registration_manager,
        })
    }

    /// Services backed by a fresh [`MemoryStore`]
    pub fn in_memory(settings: &Settings, clock: Arc<dyn Clock>) -> Result<(Self, MemoryStore)> {
        let store = MemoryStore::new();
        let shared = Arc::new(store.clone());
        let services = Self::new(settings, shared.clone(), shared, clock)?;

        Ok((services, store))
    }
}
