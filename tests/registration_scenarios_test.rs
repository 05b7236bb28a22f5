//! Registration lifecycle scenarios
//!
//! Exercises the registration manager end to end over the in-memory store:
//! applying, rejection reasons, cancelling, and the derived capacity facts.

mod helpers;

use std::collections::HashSet;

use asakatsu::models::RegistrationStatus;
use asakatsu::{CancellationError, Clock, RegistrationError};
use assert_matches::assert_matches;
use chrono::Duration;
use helpers::*;

const USER_A: i64 = 101;
const USER_B: i64 = 102;
const USER_C: i64 = 103;

#[tokio::test]
async fn test_capacity_fills_then_rejects() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(2).await;

    manager.register(event.id, USER_A).await.expect("first registration");
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 1);
    assert!(manager.has_available_slots(event.id).await.unwrap());

    manager.register(event.id, USER_B).await.expect("second registration");
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 2);
    assert!(!manager.has_available_slots(event.id).await.unwrap());

    assert_matches!(
        manager.register(event.id, USER_C).await,
        Err(RegistrationError::EventFull { capacity: 2, .. })
    );
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 2);
    assert!(!manager.is_registered(event.id, USER_C).await.unwrap());
}

#[tokio::test]
async fn test_duplicate_application_is_rejected() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(5).await;

    manager.register(event.id, USER_A).await.unwrap();
    assert_matches!(
        manager.register(event.id, USER_A).await,
        Err(RegistrationError::AlreadyRegistered { user_id: USER_A, .. })
    );
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 1);
    assert_eq!(manager.event_registrations(event.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancel_without_registration_then_apply() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(5).await;

    assert_matches!(
        manager.cancel(event.id, USER_A).await,
        Err(CancellationError::NotRegistered { user_id: USER_A, .. })
    );

    let registration = manager.register(event.id, USER_A).await.unwrap();
    assert_eq!(registration.status, RegistrationStatus::Confirmed);
}

#[tokio::test]
async fn test_finished_event_rejects_regardless_of_capacity() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let now = ctx.clock.now();
    let event = ctx
        .store
        .insert_event(event_row(now - Duration::days(2), now - Duration::days(2) + Duration::hours(2), 50))
        .await;

    assert_matches!(
        manager.register(event.id, USER_A).await,
        Err(RegistrationError::EventFinished { .. })
    );
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_event_finishing_while_open() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(10).await;

    manager.register(event.id, USER_A).await.unwrap();

    // an event that has started but not ended still accepts applications
    ctx.clock.set(event.start_time + Duration::minutes(30));
    manager.register(event.id, USER_B).await.unwrap();

    ctx.clock.set(event.end_time + Duration::seconds(1));
    assert_matches!(
        manager.register(event.id, USER_C).await,
        Err(RegistrationError::EventFinished { .. })
    );
}

#[tokio::test]
async fn test_cancel_releases_the_slot() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(1).await;

    manager.register(event.id, USER_A).await.unwrap();
    assert!(!manager.has_available_slots(event.id).await.unwrap());

    manager.cancel(event.id, USER_A).await.unwrap();
    assert!(!manager.is_registered(event.id, USER_A).await.unwrap());
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 0);
    assert!(manager.has_available_slots(event.id).await.unwrap());

    // the cancelled row stays on record
    let rows = manager.event_registrations(event.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_cancelled());

    manager.register(event.id, USER_B).await.expect("freed slot");
}

#[tokio::test]
async fn test_double_cancel_is_rejected() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(3).await;

    manager.register(event.id, USER_A).await.unwrap();
    manager.cancel(event.id, USER_A).await.unwrap();

    assert_matches!(
        manager.cancel(event.id, USER_A).await,
        Err(CancellationError::NotRegistered { .. })
    );
}

#[tokio::test]
async fn test_reapply_after_cancel_reuses_the_row() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(3).await;

    let first = manager.register(event.id, USER_A).await.unwrap();
    manager.cancel(event.id, USER_A).await.unwrap();

    ctx.clock.advance(Duration::hours(1));
    let second = manager.register(event.id, USER_A).await.unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, RegistrationStatus::Confirmed);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(manager.event_registrations(event.id).await.unwrap().len(), 1);
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_reapply_after_cancel_still_respects_capacity() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(1).await;

    manager.register(event.id, USER_A).await.unwrap();
    manager.cancel(event.id, USER_A).await.unwrap();
    manager.register(event.id, USER_B).await.unwrap();

    assert_matches!(
        manager.register(event.id, USER_A).await,
        Err(RegistrationError::EventFull { .. })
    );
}

#[tokio::test]
async fn test_pending_registration_counts_as_registered_but_not_confirmed() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(2).await;

    ctx.store
        .insert_registration(event.id, USER_A, RegistrationStatus::Pending, ctx.clock.now())
        .await
        .unwrap();

    assert!(manager.is_registered(event.id, USER_A).await.unwrap());
    let rows = manager.event_registrations(event.id).await.unwrap();
    assert!(rows[0].is_pending());
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 0);
    assert_matches!(
        manager.register(event.id, USER_A).await,
        Err(RegistrationError::AlreadyRegistered { .. })
    );

    manager.cancel(event.id, USER_A).await.expect("pending can be cancelled");
    assert!(!manager.is_registered(event.id, USER_A).await.unwrap());
}

#[tokio::test]
async fn test_deleted_event_is_not_found() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(2).await;

    manager.register(event.id, USER_A).await.unwrap();
    ctx.services
        .event_service
        .delete_event(TEST_ADMIN_ID, event.id)
        .await
        .unwrap();

    assert_matches!(
        manager.register(event.id, USER_B).await,
        Err(RegistrationError::NotFound { .. })
    );

    // the user still sees the registration on their page
    let mine = manager.user_registrations(USER_A).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].event.id, event.id);
}

#[tokio::test]
async fn test_cancellation_cutoff_from_settings() {
    let mut settings = test_settings();
    settings.registration.enforce_cancellation_cutoff = true;
    settings.registration.cancellation_cutoff_hours = 24;
    let ctx = TestContext::with_settings(settings);
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(3).await;

    manager.register(event.id, USER_A).await.unwrap();
    manager.register(event.id, USER_B).await.unwrap();

    manager.cancel(event.id, USER_A).await.expect("well before the cutoff");

    ctx.clock.set(event.start_time - Duration::hours(12));
    assert_matches!(
        manager.cancel(event.id, USER_B).await,
        Err(CancellationError::CutoffPassed { cutoff_hours: 24, .. })
    );
    assert!(manager.is_registered(event.id, USER_B).await.unwrap());
}

#[tokio::test]
async fn test_user_registrations_are_soonest_first() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let later = ctx.publish_event(5).await;
    let sooner = ctx
        .services
        .event_service
        .create_event(TEST_ADMIN_ID, event_starting_in(ctx.clock.now(), Duration::days(1), 5))
        .await
        .unwrap();

    manager.register(later.id, USER_A).await.unwrap();
    manager.register(sooner.id, USER_A).await.unwrap();
    manager.cancel(later.id, USER_A).await.unwrap();

    let mine = manager.user_registrations(USER_A).await.unwrap();
    let order: Vec<i64> = mine.iter().map(|r| r.event.id).collect();
    assert_eq!(order, vec![sooner.id, later.id]);
    assert_eq!(mine[1].registration.status, RegistrationStatus::Cancelled);
}

#[tokio::test]
async fn test_availability_flags() {
    let ctx = TestContext::new();
    let manager = &ctx.services.registration_manager;
    let event = ctx.publish_event(5).await;

    for user_id in 1..=4 {
        manager.register(event.id, 200 + user_id).await.unwrap();
    }
    let availability = manager.availability(event.id).await.unwrap();
    assert_eq!(availability.confirmed, 4);
    assert_eq!(availability.remaining, 1);
    assert!(!availability.is_full);
    assert!(!availability.is_almost_full);

    manager.register(event.id, 205).await.unwrap();
    let availability = manager.availability(event.id).await.unwrap();
    assert!(availability.is_full);
    assert_eq!(availability.remaining, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_applications_never_overbook() {
    let ctx = TestContext::new();
    let event = ctx.publish_event(3).await;

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let manager = ctx.services.registration_manager.clone();
            let event_id = event.id;
            tokio::spawn(async move { (1000 + i, manager.register(event_id, 1000 + i).await) })
        })
        .collect();

    let mut admitted = HashSet::new();
    for handle in futures::future::join_all(handles).await {
        let (user_id, outcome) = handle.expect("task panicked");
        match outcome {
            Ok(_) => {
                admitted.insert(user_id);
            }
            Err(e) => assert_matches!(e, RegistrationError::EventFull { .. }),
        }
    }

    let manager = &ctx.services.registration_manager;
    assert_eq!(admitted.len(), 3);
    assert_eq!(manager.confirmed_count(event.id).await.unwrap(), 3);
    for user_id in admitted {
        assert!(manager.is_registered(event.id, user_id).await.unwrap());
    }
}
