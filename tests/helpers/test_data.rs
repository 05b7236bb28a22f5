//! Test data helpers for creating events

use asakatsu::models::{CreateEventRequest, Event};
use chrono::{DateTime, Duration, Utc};
use fake::faker::address::en::CityName;
use fake::faker::lorem::en::{Sentence, Words};
use fake::Fake;

/// A valid event request starting `lead` after `now`, lasting two hours
pub fn event_starting_in(now: DateTime<Utc>, lead: Duration, capacity: i32) -> CreateEventRequest {
    let words: Vec<String> = Words(2..4).fake();
    let start_time = now + lead;

    CreateEventRequest {
        name: format!("Morning {}", words.join(" ")),
        description: Sentence(4..8).fake(),
        start_time,
        end_time: start_time + Duration::hours(2),
        location: CityName().fake(),
        requirements: None,
        fee: 0,
        contact: "organizer@example.com".to_string(),
        capacity,
        image_path: None,
    }
}

/// A fully formed event row, for seeding states the services would refuse
/// to create (past events, for example)
pub fn event_row(start_time: DateTime<Utc>, end_time: DateTime<Utc>, capacity: i32) -> Event {
    let created_at = start_time - Duration::days(7);

    Event {
        id: 0,
        name: "Sunrise yoga".to_string(),
        description: Sentence(4..8).fake(),
        start_time,
        end_time,
        location: CityName().fake(),
        requirements: Some("Yoga mat".to_string()),
        fee: 500,
        contact: "yoga@example.com".to_string(),
        capacity,
        image_path: None,
        created_at,
        updated_at: created_at,
        deleted_at: None,
    }
}
