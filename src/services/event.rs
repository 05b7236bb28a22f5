//! Event service implementation
//!
//! Administrator-only event management (create, edit, soft delete) and the
//! public event listing with its search filters.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, info};

use super::auth::AuthService;
use crate::config::EventsConfig;
use crate::database::EventStore;
use crate::models::{
    CreateEventRequest, DateFilter, Event, EventFilter, EventListQuery, EventPage, UpdateEventRequest,
};
use crate::utils::clock::Clock;
use crate::utils::errors::{AsakatsuError, Result};
use crate::utils::helpers::{local_date, local_day_bounds, local_week_bounds, utc_offset};
use crate::utils::logging::log_admin_action;

const MAX_NAME_LENGTH: usize = 255;
const MAX_LOCATION_LENGTH: usize = 500;
const MAX_CONTACT_LENGTH: usize = 50;

#[derive(Clone)]
pub struct EventService {
    events: Arc<dyn EventStore>,
    auth: AuthService,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    max_capacity: i32,
    page_size: u32,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventStore>,
        auth: AuthService,
        clock: Arc<dyn Clock>,
        config: &EventsConfig,
    ) -> Result<Self> {
        Ok(Self {
            events,
            auth,
            clock,
            offset: utc_offset(config.utc_offset_minutes)?,
            max_capacity: config.max_capacity,
            page_size: config.page_size,
        })
    }

    /// Create a new event (admin only)
    pub async fn create_event(&self, actor_id: i64, request: CreateEventRequest) -> Result<Event> {
        self.auth.require_admin(actor_id, "create events")?;

        let now = self.clock.now();
        self.validate(&EventFields {
            name: &request.name,
            description: &request.description,
            location: &request.location,
            contact: &request.contact,
            fee: request.fee,
            capacity: request.capacity,
            start_time: request.start_time,
            end_time: request.end_time,
        })?;
        if local_date(request.start_time, self.offset) < local_date(now, self.offset) {
            return Err(AsakatsuError::InvalidInput(
                "Start date must be today or later".to_string(),
            ));
        }

        let event = self.events.create_event(&request, now).await?;
        log_admin_action(actor_id, "create_event", Some(&event.id.to_string()), Some(&event.name));
        info!(event_id = event.id, capacity = event.capacity, "Event created");

        Ok(event)
    }

    /// Update an event (admin only); absent fields keep their value
    pub async fn update_event(&self, actor_id: i64, event_id: i64, request: UpdateEventRequest) -> Result<Event> {
        self.auth.require_admin(actor_id, "edit events")?;

        let now = self.clock.now();
        if request.start_time.is_some_and(|start_time| start_time <= now) {
            return Err(AsakatsuError::InvalidInput(
                "Start time must be in the future".to_string(),
            ));
        }

        let current = self.get_event(event_id).await?;
        let merged = request.merge_into(&current);
        self.validate(&EventFields {
            name: &merged.name,
            description: &merged.description,
            location: &merged.location,
            contact: &merged.contact,
            fee: merged.fee,
            capacity: merged.capacity,
            start_time: merged.start_time,
            end_time: merged.end_time,
        })?;

        let event = self
            .events
            .update_event(&merged, now)
            .await?
            .ok_or(AsakatsuError::EventNotFound { event_id })?;
        log_admin_action(actor_id, "update_event", Some(&event_id.to_string()), None);

        Ok(event)
    }

    /// Soft delete an event (admin only); its registrations are retained
    pub async fn delete_event(&self, actor_id: i64, event_id: i64) -> Result<()> {
        self.auth.require_admin(actor_id, "delete events")?;

        if !self.events.soft_delete_event(event_id, self.clock.now()).await? {
            return Err(AsakatsuError::EventNotFound { event_id });
        }
        log_admin_action(actor_id, "delete_event", Some(&event_id.to_string()), None);

        Ok(())
    }

    /// Get a non-deleted event
    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or(AsakatsuError::EventNotFound { event_id })
    }

    /// One page (1-based) of upcoming events matching the filter
    pub async fn list_events(&self, filter: &EventFilter, page: u32) -> Result<EventPage> {
        let page = page.max(1);
        let query = self.build_query(filter, page, self.clock.now());
        debug!(page = page, filter = ?filter, "Listing events");

        let events = self.events.list_events(&query).await?;
        let total = self.events.count_events(&query).await?;

        Ok(EventPage {
            events,
            total,
            page,
            per_page: self.page_size,
        })
    }

    fn build_query(&self, filter: &EventFilter, page: u32, now: DateTime<Utc>) -> EventListQuery {
        let (window_start, window_end) = match filter.date {
            DateFilter::All => (None, None),
            DateFilter::Today => {
                let (start, end) = local_day_bounds(now, self.offset);
                (Some(start), Some(end))
            }
            DateFilter::ThisWeek => {
                let (start, end) = local_week_bounds(now, self.offset);
                (Some(start), Some(end))
            }
        };

        EventListQuery {
            name_contains: non_blank(&filter.name),
            location_contains: non_blank(&filter.location),
            starts_after: now,
            window_start,
            window_end,
            fee: filter.fee,
            limit: i64::from(self.page_size),
            offset: i64::from(page - 1) * i64::from(self.page_size),
        }
    }

    fn validate(&self, fields: &EventFields<'_>) -> Result<()> {
        require_text("Name", fields.name, Some(MAX_NAME_LENGTH))?;
        require_text("Description", fields.description, None)?;
        require_text("Location", fields.location, Some(MAX_LOCATION_LENGTH))?;
        require_text("Contact", fields.contact, Some(MAX_CONTACT_LENGTH))?;

        if fields.fee < 0 {
            return Err(AsakatsuError::InvalidInput("Fee must not be negative".to_string()));
        }

        if fields.capacity < 1 || fields.capacity > self.max_capacity {
            return Err(AsakatsuError::InvalidInput(format!(
                "Capacity must be between 1 and {}",
                self.max_capacity
            )));
        }

        if fields.end_time <= fields.start_time {
            return Err(AsakatsuError::InvalidInput(
                "End time must be after start time".to_string(),
            ));
        }

        Ok(())
    }
}

/// The validated subset of an event
struct EventFields<'a> {
    name: &'a str,
    description: &'a str,
    location: &'a str,
    contact: &'a str,
    fee: i32,
    capacity: i32,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

fn require_text(field: &str, value: &str, max_chars: Option<usize>) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AsakatsuError::InvalidInput(format!("{} is required", field)));
    }
    if let Some(max) = max_chars {
        if value.chars().count() > max {
            return Err(AsakatsuError::InvalidInput(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
