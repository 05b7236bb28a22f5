//! Asakatsu bootstrap
//!
//! Loads configuration, prepares the database and reports the availability
//! of the next page of upcoming events.

use std::sync::Arc;

use anyhow::Context;
use futures::future::try_join_all;
use tracing::info;

use asakatsu::{
    config::Settings,
    database::{connection::{create_pool, run_migrations, DatabaseConfig}, DatabaseService},
    models::EventFilter,
    utils::{helpers::format_timestamp, logging},
    ServiceFactory, SystemClock,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading configuration")?;
    settings.validate().context("validating configuration")?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", asakatsu::info());

    // Initialize database connection
    info!("Connecting to database...");
    let db_pool = create_pool(&DatabaseConfig::from(&settings.database))
        .await
        .context("connecting to database")?;
    run_migrations(&db_pool).await.context("running migrations")?;

    let database_service = DatabaseService::new(db_pool.clone());
    let services = ServiceFactory::new(
        &settings,
        database_service.event_store(),
        database_service.registration_store(),
        Arc::new(SystemClock),
    )?;

    let page = services
        .event_service
        .list_events(&EventFilter::default(), 1)
        .await?;
    info!(total = page.total, shown = page.events.len(), "Upcoming events");

    let manager = &services.registration_manager;
    let availability = try_join_all(page.events.iter().map(|event| manager.availability(event.id))).await?;
    for (event, slots) in page.events.iter().zip(availability) {
        info!(
            event_id = event.id,
            name = %event.name,
            start_time = %format_timestamp(event.start_time),
            fee = %event.formatted_fee(),
            confirmed = slots.confirmed,
            capacity = slots.capacity,
            is_full = slots.is_full,
            "Event availability"
        );
    }

    db_pool.close().await;
    info!("Asakatsu bootstrap finished.");

    Ok(())
}
