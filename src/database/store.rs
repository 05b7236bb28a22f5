//! Storage seams
//!
//! Services talk to persistence through these traits. The Postgres
//! repositories and [`MemoryStore`](super::memory::MemoryStore) both
//! implement them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    CancellationPolicy, CreateEventRequest, Event, EventListQuery, EventRegistration, RegisteredEvent,
};
use crate::utils::errors::{CancellationError, RegistrationError, Result};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, request: &CreateEventRequest, now: DateTime<Utc>) -> Result<Event>;

    /// Non-deleted event by id
    async fn find_event(&self, event_id: i64) -> Result<Option<Event>>;

    /// Overwrite the editable fields of a non-deleted event with those of
    /// `event`. Fails with `InvalidInput` when the new capacity is below the
    /// confirmed count; returns `None` when the event does not exist.
    async fn update_event(&self, event: &Event, now: DateTime<Utc>) -> Result<Option<Event>>;

    /// Mark the event deleted; `false` when it was missing or already deleted
    async fn soft_delete_event(&self, event_id: i64, now: DateTime<Utc>) -> Result<bool>;

    async fn list_events(&self, query: &EventListQuery) -> Result<Vec<Event>>;

    async fn count_events(&self, query: &EventListQuery) -> Result<i64>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn count_confirmed(&self, event_id: i64) -> Result<i64>;

    /// The pending or confirmed registration for the pair, if any
    async fn find_active_registration(&self, event_id: i64, user_id: i64) -> Result<Option<EventRegistration>>;

    async fn list_event_registrations(&self, event_id: i64) -> Result<Vec<EventRegistration>>;

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<RegisteredEvent>>;

    /// Evaluate [`ApplicationSnapshot::admit`](crate::models::ApplicationSnapshot::admit)
    /// and write the confirmed registration as one atomic step per event.
    async fn register(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> std::result::Result<EventRegistration, RegistrationError>;

    /// Evaluate [`CancellationSnapshot::check`](crate::models::CancellationSnapshot::check)
    /// and mark the registration cancelled as one atomic step per event.
    async fn cancel(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
        policy: &CancellationPolicy,
    ) -> std::result::Result<EventRegistration, CancellationError>;
}
