//! In-memory store
//!
//! Keeps events and registrations in process memory behind one lock. Every
//! check-then-write sequence runs while the write lock is held, which gives
//! the same per-event serialization the Postgres repositories get from
//! `SELECT ... FOR UPDATE`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::store::{EventStore, RegistrationStore};
use crate::models::{
    Admission, ApplicationSnapshot, CancellationPolicy, CancellationSnapshot, CreateEventRequest, Event,
    EventListQuery, EventRegistration, RegisteredEvent, RegistrationStatus,
};
use crate::utils::errors::{AsakatsuError, CancellationError, RegistrationError, Result};

#[derive(Default)]
struct MemoryState {
    events: BTreeMap<i64, Event>,
    registrations: BTreeMap<i64, EventRegistration>,
    /// (event_id, user_id) -> registration id
    by_pair: HashMap<(i64, i64), i64>,
    /// event_id -> registration ids in insertion order
    by_event: HashMap<i64, Vec<i64>>,
    /// user_id -> registration ids in insertion order
    by_user: HashMap<i64, Vec<i64>>,
    next_event_id: i64,
    next_registration_id: i64,
}

impl MemoryState {
    fn live_event(&self, event_id: i64) -> Option<&Event> {
        self.events.get(&event_id).filter(|event| !event.is_deleted())
    }

    fn registration_for(&self, event_id: i64, user_id: i64) -> Option<&EventRegistration> {
        self.by_pair
            .get(&(event_id, user_id))
            .and_then(|id| self.registrations.get(id))
    }

    fn registrations_of<'a>(
        &'a self,
        index: &'a HashMap<i64, Vec<i64>>,
        key: i64,
    ) -> impl Iterator<Item = &'a EventRegistration> + 'a {
        index
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.registrations.get(id))
    }

    fn confirmed(&self, event_id: i64) -> i64 {
        self.registrations_of(&self.by_event, event_id)
            .filter(|r| r.is_confirmed())
            .count() as i64
    }

    fn insert_registration(
        &mut self,
        event_id: i64,
        user_id: i64,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> EventRegistration {
        self.next_registration_id += 1;
        let registration = EventRegistration {
            id: self.next_registration_id,
            event_id,
            user_id,
            status,
            created_at: now,
            updated_at: now,
        };
        self.registrations.insert(registration.id, registration.clone());
        self.by_pair.insert((event_id, user_id), registration.id);
        self.by_event.entry(event_id).or_default().push(registration.id);
        self.by_user.entry(user_id).or_default().push(registration.id);
        registration
    }

    fn set_status(
        &mut self,
        registration_id: i64,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration> {
        let registration = self.registrations.get_mut(&registration_id).ok_or_else(|| {
            AsakatsuError::InvalidInput(format!("Registration {} disappeared", registration_id))
        })?;
        registration.status = status;
        registration.updated_at = now;
        Ok(registration.clone())
    }
}

/// Process-local implementation of both storage traits. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed event, keeping its timestamps. Assigns a fresh id.
    pub async fn insert_event(&self, mut event: Event) -> Event {
        let mut state = self.state.write().await;
        state.next_event_id += 1;
        event.id = state.next_event_id;
        state.events.insert(event.id, event.clone());
        event
    }

    /// Insert a registration row with an arbitrary status, bypassing the
    /// admission rules. The (event, user) pair must not have a row yet.
    pub async fn insert_registration(
        &self,
        event_id: i64,
        user_id: i64,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration> {
        let mut state = self.state.write().await;
        if state.registration_for(event_id, user_id).is_some() {
            return Err(AsakatsuError::InvalidInput(format!(
                "Registration for event {} and user {} already exists",
                event_id, user_id
            )));
        }
        Ok(state.insert_registration(event_id, user_id, status, now))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, request: &CreateEventRequest, now: DateTime<Utc>) -> Result<Event> {
        let event = Event {
            id: 0,
            name: request.name.clone(),
            description: request.description.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
            location: request.location.clone(),
            requirements: request.requirements.clone(),
            fee: request.fee,
            contact: request.contact.clone(),
            capacity: request.capacity,
            image_path: request.image_path.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        Ok(self.insert_event(event).await)
    }

    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        let state = self.state.read().await;
        Ok(state.live_event(event_id).cloned())
    }

    async fn update_event(&self, event: &Event, now: DateTime<Utc>) -> Result<Option<Event>> {
        let mut state = self.state.write().await;
        if state.live_event(event.id).is_none() {
            return Ok(None);
        }

        let confirmed = state.confirmed(event.id);
        if i64::from(event.capacity) < confirmed {
            return Err(AsakatsuError::InvalidInput(format!(
                "Capacity {} is below the {} confirmed participants",
                event.capacity, confirmed
            )));
        }

        let Some(stored) = state.events.get_mut(&event.id) else {
            return Ok(None);
        };
        stored.name = event.name.clone();
        stored.description = event.description.clone();
        stored.start_time = event.start_time;
        stored.end_time = event.end_time;
        stored.location = event.location.clone();
        stored.requirements = event.requirements.clone();
        stored.fee = event.fee;
        stored.contact = event.contact.clone();
        stored.capacity = event.capacity;
        stored.image_path = event.image_path.clone();
        stored.updated_at = now;
        Ok(Some(stored.clone()))
    }

    async fn soft_delete_event(&self, event_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.events.get_mut(&event_id) {
            Some(event) if !event.is_deleted() => {
                event.deleted_at = Some(now);
                event.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_events(&self, query: &EventListQuery) -> Result<Vec<Event>> {
        let state = self.state.read().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        events.sort_by_key(|event| (event.start_time, event.id));

        Ok(events
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect())
    }

    async fn count_events(&self, query: &EventListQuery) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.events.values().filter(|event| query.matches(event)).count() as i64)
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn count_confirmed(&self, event_id: i64) -> Result<i64> {
        let state = self.state.read().await;
        Ok(state.confirmed(event_id))
    }

    async fn find_active_registration(&self, event_id: i64, user_id: i64) -> Result<Option<EventRegistration>> {
        let state = self.state.read().await;
        Ok(state
            .registration_for(event_id, user_id)
            .filter(|r| r.is_active())
            .cloned())
    }

    async fn list_event_registrations(&self, event_id: i64) -> Result<Vec<EventRegistration>> {
        let state = self.state.read().await;
        let mut registrations: Vec<EventRegistration> =
            state.registrations_of(&state.by_event, event_id).cloned().collect();
        registrations.sort_by_key(|r| (r.created_at, r.id));
        Ok(registrations)
    }

    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        let state = self.state.read().await;
        let mut registered: Vec<RegisteredEvent> = state
            .registrations_of(&state.by_user, user_id)
            .filter_map(|r| {
                state.events.get(&r.event_id).map(|event| RegisteredEvent {
                    registration: r.clone(),
                    event: event.clone(),
                })
            })
            .collect();
        registered.sort_by_key(|r| (r.event.start_time, r.event.id));
        Ok(registered)
    }

    async fn register(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> std::result::Result<EventRegistration, RegistrationError> {
        let mut state = self.state.write().await;

        let snapshot = ApplicationSnapshot {
            event_id,
            user_id,
            event: state.live_event(event_id).cloned(),
            confirmed: state.confirmed(event_id),
            existing: state.registration_for(event_id, user_id).cloned(),
        };

        let registration = match snapshot.admit(now)? {
            Admission::Insert => state.insert_registration(event_id, user_id, RegistrationStatus::Confirmed, now),
            Admission::Reapply { registration_id } => {
                state.set_status(registration_id, RegistrationStatus::Confirmed, now)?
            }
        };
        Ok(registration)
    }

    async fn cancel(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
        policy: &CancellationPolicy,
    ) -> std::result::Result<EventRegistration, CancellationError> {
        let mut state = self.state.write().await;

        let snapshot = CancellationSnapshot {
            event_id,
            user_id,
            event: state.events.get(&event_id).cloned(),
            existing: state.registration_for(event_id, user_id).cloned(),
        };

        let (registration_id, status) = snapshot.check(now, policy)?;
        Ok(state.set_status(registration_id, status, now)?)
    }
}
