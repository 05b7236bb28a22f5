//! Event model

use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::utils::helpers::format_yen;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub requirements: Option<String>,
    /// Whole yen
    pub fee: i32,
    pub contact: String,
    pub capacity: i32,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Where an event sits relative to the current instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPhase {
    Upcoming,
    InProgress,
    Finished,
}

impl Event {
    pub fn is_started(&self, now: DateTime<Utc>) -> bool {
        now > self.start_time
    }

    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        now > self.end_time
    }

    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        self.is_started(now) && !self.is_finished(now)
    }

    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        if self.is_finished(now) {
            EventPhase::Finished
        } else if self.is_started(now) {
            EventPhase::InProgress
        } else {
            EventPhase::Upcoming
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Whether one more confirmed participant fits
    pub fn has_available_slots(&self, confirmed: i64) -> bool {
        confirmed < i64::from(self.capacity)
    }

    pub fn formatted_fee(&self) -> String {
        format_yen(self.fee)
    }

    pub fn has_image(&self) -> bool {
        self.image_path.as_deref().is_some_and(|path| !path.is_empty())
    }
}

/// Capacity figures for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAvailability {
    pub event_id: i64,
    pub capacity: i32,
    pub confirmed: i64,
    pub remaining: i64,
    pub is_full: bool,
    /// More than 80% of the seats are taken
    pub is_almost_full: bool,
}

impl EventAvailability {
    pub fn new(event: &Event, confirmed: i64) -> Self {
        let capacity = i64::from(event.capacity);
        let is_full = !event.has_available_slots(confirmed);
        Self {
            event_id: event.id,
            capacity: event.capacity,
            confirmed,
            remaining: (capacity - confirmed).max(0),
            is_full,
            is_almost_full: !is_full && confirmed * 10 > capacity * 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub requirements: Option<String>,
    pub fee: i32,
    pub contact: String,
    pub capacity: i32,
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    /// `Some(None)` clears the requirements
    #[serde(default, deserialize_with = "present_or_null")]
    pub requirements: Option<Option<String>>,
    pub fee: Option<i32>,
    pub contact: Option<String>,
    pub capacity: Option<i32>,
    /// `Some(None)` removes the image
    #[serde(default, deserialize_with = "present_or_null")]
    pub image_path: Option<Option<String>>,
}

/// A present field becomes `Some`, even when its value is null
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateEventRequest {
    /// Apply the present fields on top of `event`
    pub fn merge_into(&self, event: &Event) -> Event {
        let mut merged = event.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(start_time) = self.start_time {
            merged.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            merged.end_time = end_time;
        }
        if let Some(location) = &self.location {
            merged.location = location.clone();
        }
        if let Some(requirements) = &self.requirements {
            merged.requirements = requirements.clone();
        }
        if let Some(fee) = self.fee {
            merged.fee = fee;
        }
        if let Some(contact) = &self.contact {
            merged.contact = contact.clone();
        }
        if let Some(capacity) = self.capacity {
            merged.capacity = capacity;
        }
        if let Some(image_path) = &self.image_path {
            merged.image_path = image_path.clone();
        }
        merged
    }
}

/// Calendar filter for event listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFilter {
    #[default]
    All,
    Today,
    ThisWeek,
}

/// Fee bracket filter for event listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeeRange {
    #[default]
    All,
    Free,
    Paid,
    Low,
    Medium,
    High,
}

impl FeeRange {
    /// Inclusive `(min, max)` bounds in yen
    pub fn bounds(self) -> (i32, Option<i32>) {
        match self {
            FeeRange::All => (0, None),
            FeeRange::Free => (0, Some(0)),
            FeeRange::Paid => (1, None),
            FeeRange::Low => (1, Some(1000)),
            FeeRange::Medium => (1001, Some(3000)),
            FeeRange::High => (3001, None),
        }
    }

    pub fn contains(self, fee: i32) -> bool {
        let (min, max) = self.bounds();
        fee >= min && max.map_or(true, |max| fee <= max)
    }
}

/// Listing filter as the web layer submits it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    pub name: Option<String>,
    pub location: Option<String>,
    pub date: DateFilter,
    pub fee: FeeRange,
}

/// Fully resolved listing query handed to the store
#[derive(Debug, Clone)]
pub struct EventListQuery {
    pub name_contains: Option<String>,
    pub location_contains: Option<String>,
    /// Exclusive lower bound on `start_time`
    pub starts_after: DateTime<Utc>,
    /// Lower bound of the calendar window, inclusive
    pub window_start: Option<DateTime<Utc>>,
    /// Upper bound of the calendar window, exclusive
    pub window_end: Option<DateTime<Utc>>,
    pub fee: FeeRange,
    pub limit: i64,
    pub offset: i64,
}

impl EventListQuery {
    /// In-process evaluation of the filter (everything except paging)
    pub fn matches(&self, event: &Event) -> bool {
        fn contains_ci(haystack: &str, needle: &Option<String>) -> bool {
            needle
                .as_deref()
                .map_or(true, |needle| haystack.to_lowercase().contains(&needle.to_lowercase()))
        }

        !event.is_deleted()
            && event.start_time > self.starts_after
            && self.window_start.map_or(true, |start| event.start_time >= start)
            && self.window_end.map_or(true, |end| event.start_time < end)
            && self.fee.contains(event.fee)
            && contains_ci(&event.name, &self.name_contains)
            && contains_ci(&event.location, &self.location_contains)
    }
}

/// One page of an event listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl EventPage {
    pub fn last_page(&self) -> u32 {
        if self.total <= 0 {
            return 1;
        }
        let per_page = i64::from(self.per_page.max(1));
        u32::try_from((self.total + per_page - 1) / per_page).unwrap_or(u32::MAX)
    }

    pub fn has_more(&self) -> bool {
        self.page < self.last_page()
    }
}
