//! Event repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::store::EventStore;
use crate::models::event::{CreateEventRequest, Event, EventListQuery};
use crate::utils::errors::{AsakatsuError, Result};

pub(crate) const EVENT_COLUMNS: &str = "id, name, description, start_time, end_time, location, requirements, fee, contact, capacity, image_path, created_at, updated_at, deleted_at";

// Shared by list and count; parameters $1..$7 are bound in the same order by both
const FILTER_CLAUSE: &str = r#"
    deleted_at IS NULL
    AND start_time > $1
    AND ($2::timestamptz IS NULL OR start_time >= $2)
    AND ($3::timestamptz IS NULL OR start_time < $3)
    AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%')
    AND ($5::text IS NULL OR location ILIKE '%' || $5 || '%')
    AND fee >= $6
    AND ($7::integer IS NULL OR fee <= $7)
"#;

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find event by ID, including soft-deleted ones
    pub async fn find_by_id_with_deleted(&self, id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    /// Count non-deleted events
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[async_trait]
impl EventStore for EventRepository {
    /// Create a new event
    async fn create_event(&self, request: &CreateEventRequest, now: DateTime<Utc>) -> Result<Event> {
        let event = sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (name, description, start_time, end_time, location, requirements, fee, contact, capacity, image_path, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(&request.location)
        .bind(&request.requirements)
        .bind(request.fee)
        .bind(&request.contact)
        .bind(request.capacity)
        .bind(&request.image_path)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Find a non-deleted event by ID
    async fn find_event(&self, event_id: i64) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {} FROM events WHERE id = $1 AND deleted_at IS NULL",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// Update event, holding the event row lock while the capacity is checked
    async fn update_event(&self, event: &Event, now: DateTime<Utc>) -> Result<Option<Event>> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM events WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
                .bind(event.id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let confirmed: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event.id)
        .fetch_one(&mut *tx)
        .await?;
        if i64::from(event.capacity) < confirmed.0 {
            return Err(AsakatsuError::InvalidInput(format!(
                "Capacity {} is below the {} confirmed participants",
                event.capacity, confirmed.0
            )));
        }

        let updated = sqlx::query_as::<_, Event>(&format!(
            r#"
            UPDATE events
            SET name = $2,
                description = $3,
                start_time = $4,
                end_time = $5,
                location = $6,
                requirements = $7,
                fee = $8,
                contact = $9,
                capacity = $10,
                image_path = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.location)
        .bind(&event.requirements)
        .bind(event.fee)
        .bind(&event.contact)
        .bind(event.capacity)
        .bind(&event.image_path)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Soft delete event
    async fn soft_delete_event(&self, event_id: i64, now: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE events SET deleted_at = $2, updated_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(event_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List upcoming events matching the filter, ordered by start time
    async fn list_events(&self, query: &EventListQuery) -> Result<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events WHERE {} ORDER BY start_time ASC, id ASC LIMIT $8 OFFSET $9",
            EVENT_COLUMNS, FILTER_CLAUSE
        );
        let (min_fee, max_fee) = query.fee.bounds();

        let events = sqlx::query_as::<_, Event>(&sql)
            .bind(query.starts_after)
            .bind(query.window_start)
            .bind(query.window_end)
            .bind(&query.name_contains)
            .bind(&query.location_contains)
            .bind(min_fee)
            .bind(max_fee)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn count_events(&self, query: &EventListQuery) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM events WHERE {}", FILTER_CLAUSE);
        let (min_fee, max_fee) = query.fee.bounds();

        let count: (i64,) = sqlx::query_as(&sql)
            .bind(query.starts_after)
            .bind(query.window_start)
            .bind(query.window_end)
            .bind(&query.name_contains)
            .bind(&query.location_contains)
            .bind(min_fee)
            .bind(max_fee)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
