//! Async entry points for a host application. Each call opens the store on
//! tokio's blocking pool and reports failures as display strings.

use std::path::PathBuf;

use chrono::Utc;

use crate::config::AppConfig;
use crate::db::Store;
use crate::models::{Event, EventInput, EventMode, EventPatch};
use crate::service::{EventService, ServiceResult};

async fn with_service<T, F>(config: &AppConfig, work: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce(&EventService) -> ServiceResult<T> + Send + 'static,
{
    let path: PathBuf = config.database_path();
    tokio::task::spawn_blocking(move || -> Result<T, String> {
        let store = Store::open(&path).map_err(|e| e.to_string())?;
        let service = EventService::new(store);
        work(&service).map_err(|e| e.to_string())
    })
    .await
    .map_err(|e| e.to_string())?
}

pub async fn create_event(config: &AppConfig, input: EventInput) -> Result<Event, String> {
    with_service(config, move |service| service.create_event(input)).await
}

pub async fn update_event(
    config: &AppConfig,
    id: String,
    patch: EventPatch,
) -> Result<Event, String> {
    with_service(config, move |service| service.update_event(&id, patch)).await
}

pub async fn get_event_by_slug(config: &AppConfig, slug: String) -> Result<Option<Event>, String> {
    with_service(config, move |service| service.get_event_by_slug(&slug)).await
}

pub async fn list_featured_events(config: &AppConfig) -> Result<Vec<Event>, String> {
    let today = Utc::now().date_naive();
    let limit = config.featured_limit;
    with_service(config, move |service| service.featured_events(today, limit)).await
}

pub async fn list_events_by_mode(config: &AppConfig, mode: String) -> Result<Vec<Event>, String> {
    let mode = mode
        .trim()
        .parse::<EventMode>()
        .map_err(|e| e.to_string())?;
    with_service(config, move |service| service.events_by_mode(mode)).await
}
