//! Event registration model
//!
//! A registration ties one user to one event and carries its lifecycle
//! status. The admission and cancellation rules live here as pure functions
//! over a snapshot of the store, so every storage backend evaluates them the
//! same way while holding its own lock.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::event::Event;
use crate::utils::errors::{AsakatsuError, CancellationError, RegistrationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    /// Display label used on the member pages
    pub fn label(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "申込中",
            RegistrationStatus::Confirmed => "参加確定",
            RegistrationStatus::Cancelled => "キャンセル",
        }
    }

    /// Pending and confirmed registrations hold the (event, user) pair
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }

    /// Validate a lifecycle step. Cancelled is terminal.
    pub fn transition(self, to: RegistrationStatus) -> Result<RegistrationStatus, AsakatsuError> {
        use RegistrationStatus::*;

        match (self, to) {
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) => Ok(to),
            _ => Err(AsakatsuError::InvalidStateTransition {
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = AsakatsuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RegistrationStatus::Pending),
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            other => Err(AsakatsuError::InvalidInput(format!("Unknown registration status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRegistration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRegistration {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RegistrationStatus::Confirmed
    }

    pub fn is_pending(&self) -> bool {
        self.status == RegistrationStatus::Pending
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RegistrationStatus::Cancelled
    }
}

/// Row shape of `event_registrations`; status is stored as text
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationRow {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationRow> for EventRegistration {
    type Error = AsakatsuError;

    fn try_from(row: RegistrationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A user's registration together with the event it refers to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredEvent {
    pub registration: EventRegistration,
    pub event: Event,
}

/// What the store should write for an admitted application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No row exists for the pair yet
    Insert,
    /// A cancelled row exists and is re-applied in place
    Reapply { registration_id: i64 },
}

/// State read under the event lock before an application is written
#[derive(Debug, Clone)]
pub struct ApplicationSnapshot {
    pub event_id: i64,
    pub user_id: i64,
    /// `None` when the event is missing or soft-deleted
    pub event: Option<Event>,
    pub confirmed: i64,
    /// Any row for the pair, whatever its status
    pub existing: Option<EventRegistration>,
}

impl ApplicationSnapshot {
    /// Check the application preconditions in order: the event exists, has
    /// not finished, has a free slot, and the user holds no active registration.
    pub fn admit(&self, now: DateTime<Utc>) -> Result<Admission, RegistrationError> {
        let event = self
            .event
            .as_ref()
            .filter(|event| !event.is_deleted())
            .ok_or(RegistrationError::NotFound { event_id: self.event_id })?;

        if event.is_finished(now) {
            return Err(RegistrationError::EventFinished { event_id: self.event_id });
        }

        if !event.has_available_slots(self.confirmed) {
            return Err(RegistrationError::EventFull {
                event_id: self.event_id,
                capacity: event.capacity,
            });
        }

        match &self.existing {
            Some(existing) if existing.is_active() => Err(RegistrationError::AlreadyRegistered {
                event_id: self.event_id,
                user_id: self.user_id,
            }),
            Some(existing) => Ok(Admission::Reapply { registration_id: existing.id }),
            None => Ok(Admission::Insert),
        }
    }
}

/// Optional rule closing cancellations shortly before an event starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancellationPolicy {
    pub cutoff_hours: Option<u32>,
}

impl CancellationPolicy {
    pub fn unrestricted() -> Self {
        Self { cutoff_hours: None }
    }

    pub fn with_cutoff(hours: u32) -> Self {
        Self { cutoff_hours: Some(hours) }
    }
}

/// State read under the event lock before a cancellation is written
#[derive(Debug, Clone)]
pub struct CancellationSnapshot {
    pub event_id: i64,
    pub user_id: i64,
    /// The event, including soft-deleted ones
    pub event: Option<Event>,
    pub existing: Option<EventRegistration>,
}

impl CancellationSnapshot {
    /// Returns the registration to cancel and its new status
    pub fn check(
        &self,
        now: DateTime<Utc>,
        policy: &CancellationPolicy,
    ) -> Result<(i64, RegistrationStatus), CancellationError> {
        let registration = self
            .existing
            .as_ref()
            .filter(|registration| registration.is_active())
            .ok_or(CancellationError::NotRegistered {
                event_id: self.event_id,
                user_id: self.user_id,
            })?;

        if let (Some(hours), Some(event)) = (policy.cutoff_hours, self.event.as_ref()) {
            if now > event.start_time - Duration::hours(i64::from(hours)) {
                return Err(CancellationError::CutoffPassed {
                    event_id: self.event_id,
                    cutoff_hours: hours,
                });
            }
        }

        let next = registration.status.transition(RegistrationStatus::Cancelled)?;
        Ok((registration.id, next))
    }
}
