pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod normalize;
pub mod service;
mod utils;
pub mod validation;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;

pub use config::{AppConfig, ConfigStore};
pub use db::{Store, StoreError};
pub use models::{
    ChangedFields, Event, EventCandidate, EventField, EventInput, EventMode, EventPatch,
    NormalizedEvent,
};
pub use normalize::{derive_slug, normalize_date, normalize_time};
pub use service::{EventService, ServiceError};
pub use validation::{normalize_and_validate, ValidationError};

/// Opens the configured store, seeds it when asked to, and logs the
/// featured listing.
pub fn run() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = ConfigStore::load().read();
    let db_path = config.database_path();
    info!("dev event hub starting, database at {}", db_path.display());

    let store = Store::open(&db_path)
        .with_context(|| format!("failed to open event store at {}", db_path.display()))?;
    let service = EventService::new(store);

    if config.seed_sample_events {
        service
            .seed_if_empty()
            .context("failed to seed sample events")?;
    }

    let featured = service
        .featured_events(Utc::now().date_naive(), config.featured_limit)
        .context("failed to load featured events")?;
    info!("{} featured events", featured.len());
    for event in &featured {
        let record = &event.record;
        info!(
            "{} {} | {} ({}) | {} | /events/{}",
            record.date,
            record.time,
            event.title(),
            record.mode,
            record.location,
            event.slug()
        );
    }

    Ok(())
}
