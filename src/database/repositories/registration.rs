//! Event registration repository implementation
//!
//! `register` and `cancel` run inside a transaction that first locks the
//! event row with `SELECT ... FOR UPDATE`. Concurrent applications for the
//! same event therefore queue behind each other and the confirmed count they
//! read cannot go stale before their insert commits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use super::event::EVENT_COLUMNS;
use crate::database::store::RegistrationStore;
use crate::models::event::Event;
use crate::models::registration::{
    Admission, ApplicationSnapshot, CancellationPolicy, CancellationSnapshot, EventRegistration, RegisteredEvent,
    RegistrationRow, RegistrationStatus,
};
use crate::utils::errors::{CancellationError, RegistrationError, Result};

const REGISTRATION_COLUMNS: &str = "id, event_id, user_id, status, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the event row for the rest of the transaction
    async fn lock_event(tx: &mut Transaction<'_, Postgres>, event_id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(event)
    }

    async fn confirmed_in(tx: &mut Transaction<'_, Postgres>, event_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(count.0)
    }

    async fn registration_in(
        tx: &mut Transaction<'_, Postgres>,
        event_id: i64,
        user_id: i64,
    ) -> Result<Option<EventRegistration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM event_registrations WHERE event_id = $1 AND user_id = $2 FOR UPDATE",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(EventRegistration::try_from).transpose()
    }

    async fn set_status_in(
        tx: &mut Transaction<'_, Postgres>,
        registration_id: i64,
        status: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<EventRegistration> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE event_registrations SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            REGISTRATION_COLUMNS
        ))
        .bind(registration_id)
        .bind(status.as_str())
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        EventRegistration::try_from(row)
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    /// Count confirmed registrations for an event
    async fn count_confirmed(&self, event_id: i64) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    /// Find the pending or confirmed registration for a user
    async fn find_active_registration(&self, event_id: i64, user_id: i64) -> Result<Option<EventRegistration>> {
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM event_registrations WHERE event_id = $1 AND user_id = $2 AND status IN ('pending', 'confirmed')",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EventRegistration::try_from).transpose()
    }

    /// Get all registrations of an event
    async fn list_event_registrations(&self, event_id: i64) -> Result<Vec<EventRegistration>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM event_registrations WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
            REGISTRATION_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EventRegistration::try_from).collect()
    }

    /// Get every registration of a user with its event, soonest event first
    async fn list_user_registrations(&self, user_id: i64) -> Result<Vec<RegisteredEvent>> {
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {} FROM event_registrations WHERE user_id = $1",
            REGISTRATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let event_ids: Vec<i64> = rows.iter().map(|row| row.event_id).collect();
        let events = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = ANY($1)",
            EVENT_COLUMNS
        ))
        .bind(&event_ids)
        .fetch_all(&self.pool)
        .await?;
        let events: HashMap<i64, Event> = events.into_iter().map(|event| (event.id, event)).collect();

        let mut registered = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(event) = events.get(&row.event_id) {
                registered.push(RegisteredEvent {
                    registration: EventRegistration::try_from(row)?,
                    event: event.clone(),
                });
            }
        }
        registered.sort_by_key(|r| (r.event.start_time, r.event.id));

        Ok(registered)
    }

    async fn register(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> std::result::Result<EventRegistration, RegistrationError> {
        let mut tx = self.pool.begin().await?;

        let event = Self::lock_event(&mut tx, event_id).await?;
        let snapshot = ApplicationSnapshot {
            event_id,
            user_id,
            event,
            confirmed: Self::confirmed_in(&mut tx, event_id).await?,
            existing: Self::registration_in(&mut tx, event_id, user_id).await?,
        };

        let registration = match snapshot.admit(now)? {
            Admission::Insert => {
                let row = sqlx::query_as::<_, RegistrationRow>(&format!(
                    r#"
                    INSERT INTO event_registrations (event_id, user_id, status, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $4)
                    RETURNING {}
                    "#,
                    REGISTRATION_COLUMNS
                ))
                .bind(event_id)
                .bind(user_id)
                .bind(RegistrationStatus::Confirmed.as_str())
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                EventRegistration::try_from(row)?
            }
            Admission::Reapply { registration_id } => {
                Self::set_status_in(&mut tx, registration_id, RegistrationStatus::Confirmed, now).await?
            }
        };

        tx.commit().await?;
        Ok(registration)
    }

    async fn cancel(
        &self,
        event_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
        policy: &CancellationPolicy,
    ) -> std::result::Result<EventRegistration, CancellationError> {
        let mut tx = self.pool.begin().await?;

        let snapshot = CancellationSnapshot {
            event_id,
            user_id,
            event: Self::lock_event(&mut tx, event_id).await?,
            existing: Self::registration_in(&mut tx, event_id, user_id).await?,
        };
        let (registration_id, status) = snapshot.check(now, policy)?;
        let registration = Self::set_status_in(&mut tx, registration_id, status, now).await?;

        tx.commit().await?;
        Ok(registration)
    }
}
