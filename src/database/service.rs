//! Database service layer
//!
//! Bundles the Postgres repositories built from one pool

use std::sync::Arc;

use crate::database::{DatabasePool, EventRepository, EventStore, RegistrationRepository, RegistrationStore, UserRepository};

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool),
        }
    }

    /// Event storage as the services consume it
    pub fn event_store(&self) -> Arc<dyn EventStore> {
        Arc::new(self.events.clone())
    }

    /// Registration storage as the services consume it
    pub fn registration_store(&self) -> Arc<dyn RegistrationStore> {
        Arc::new(self.registrations.clone())
    }
}
