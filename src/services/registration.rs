//! Event registration service
//!
//! Mediates every read and write of registration state: applying to an
//! event, cancelling, and the derived availability facts. The check-and-write
//! steps are delegated to the [`RegistrationStore`], which evaluates the
//! shared admission rules under its per-event lock.

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::RegistrationConfig;
use crate::database::{EventStore, RegistrationStore};
use crate::models::{CancellationPolicy, EventAvailability, EventRegistration, RegisteredEvent};
use crate::utils::clock::Clock;
use crate::utils::errors::{AsakatsuError, CancellationError, RegistrationError, Result};
use crate::utils::logging::{log_registration_action, log_registration_rejected};

#[derive(Clone)]
pub struct RegistrationManager {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
    clock: Arc<dyn Clock>,
    policy: CancellationPolicy,
}

impl RegistrationManager {
    pub fn new(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationStore>,
        clock: Arc<dyn Clock>,
        config: &RegistrationConfig,
    ) -> Self {
        let policy = if config.enforce_cancellation_cutoff {
            CancellationPolicy::with_cutoff(config.cancellation_cutoff_hours)
        } else {
            CancellationPolicy::unrestricted()
        };

        Self {
            events,
            registrations,
            clock,
            policy,
        }
    }

    pub fn cancellation_policy(&self) -> CancellationPolicy {
        self.policy
    }

    /// Number of confirmed registrations; zero for unknown events
    pub async fn confirmed_count(&self, event_id: i64) -> Result<i64> {
        self.registrations.count_confirmed(event_id).await
    }

    /// Whether the event can take one more confirmed participant
    pub async fn has_available_slots(&self, event_id: i64) -> Result<bool> {
        let event = self
            .events
            .find_event(event_id)
            .await?
            .ok_or(AsakatsuError::EventNotFound { event_id })?;
        let confirmed = self.registrations.count_confirmed(event_id).await?;

        Ok(event.has_available_slots(confirmed))
    }

    /// Whether the user holds a pending or confirmed registration
    pub async fn is_registered(&self, event_id: i64, user_id: i64) -> Result<bool> {
        Ok(self
            .registrations
            .find_active_registration(event_id, user_id)
            .await?
            .is_some())
    }

    /// Apply to an event. Registrations are confirmed immediately.
    pub async fn register(&self, event_id: i64, user_id: i64) -> std::result::Result<EventRegistration, RegistrationError> {
        debug!(event_id = event_id, user_id = user_id, "Processing event application");

        match self.registrations.register(event_id, user_id, self.clock.now()).await {
            Ok(registration) => {
                log_registration_action(event_id, user_id, "register", registration.status.as_str());
                Ok(registration)
            }
            Err(e) => {
                if e.is_domain() {
                    log_registration_rejected(event_id, user_id, "register", &e.to_string());
                } else {
                    error!(event_id = event_id, user_id = user_id, error = %e, "Registration failed");
                }
                Err(e)
            }
        }
    }

    /// Cancel the user's active registration. The row is kept as `cancelled`.
    pub async fn cancel(&self, event_id: i64, user_id: i64) -> std::result::Result<(), CancellationError> {
        debug!(event_id = event_id, user_id = user_id, "Processing registration cancellation");

        match self
            .registrations
            .cancel(event_id, user_id, self.clock.now(), &self.policy)
            .await
        {
            Ok(registration) => {
                log_registration_action(event_id, user_id, "cancel", registration.status.as_str());
                Ok(())
            }
            Err(e) => {
                if e.is_domain() {
                    log_registration_rejected(event_id, user_id, "cancel", &e.to_string());
                } else {
                    error!(event_id = event_id, user_id = user_id, error = %e, "Cancellation failed");
                }
                Err(e)
            }
        }
    }

    /// Capacity figures for the event detail page
    pub async fn availability(&self, event_id: i64) -> Result<EventAvailability> {
        let event = self
            .events
            .find_event(event_id)
            .await?
            .ok_or(AsakatsuError::EventNotFound { event_id })?;
        let confirmed = self.registrations.count_confirmed(event_id).await?;

        Ok(EventAvailability::new(&event, confirmed))
    }

    /// Every registration of the user, soonest event first
    pub async fn user_registrations(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        self.registrations.list_user_registrations(user_id).await
    }

    /// Every registration of the event in application order
    pub async fn event_registrations(&self, event_id: i64) -> Result<Vec<EventRegistration>> {
        self.registrations.list_event_registrations(event_id).await
    }
}
