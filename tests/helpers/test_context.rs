//! Test context for unified test setup
//!
//! Builds the full service graph over a fresh in-memory store and a manual
//! clock, so tests can move time without touching the wall clock.

use std::sync::Arc;

use asakatsu::config::Settings;
use asakatsu::models::Event;
use asakatsu::{Clock, ManualClock, MemoryStore, ServiceFactory};
use chrono::{DateTime, Duration, TimeZone, Utc};

use super::test_data::event_starting_in;

/// Administrator configured in [`test_settings`]
pub const TEST_ADMIN_ID: i64 = 1;

/// Fixed "current time" of every test context: Saturday 06:00 in Tokyo
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 19, 21, 0, 0).unwrap()
}

/// Default settings with a single administrator
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.admin.user_ids = vec![TEST_ADMIN_ID];
    settings
}

/// Unified test context that manages all test components
pub struct TestContext {
    pub services: ServiceFactory,
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub settings: Settings,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let clock = ManualClock::new(test_now());
        let (services, store) = ServiceFactory::in_memory(&settings, Arc::new(clock.clone()))
            .expect("Failed to build services");

        Self {
            services,
            store,
            clock,
            settings,
        }
    }

    /// Publish an event three days ahead through the admin path
    pub async fn publish_event(&self, capacity: i32) -> Event {
        self.services
            .event_service
            .create_event(TEST_ADMIN_ID, event_starting_in(self.clock.now(), Duration::days(3), capacity))
            .await
            .expect("Failed to publish event")
    }
}
