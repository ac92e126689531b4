use chrono::NaiveDate;
use log::{debug, info};
use thiserror::Error;

use crate::db::{Store, StoreError};
use crate::models::{ChangedFields, Event, EventCandidate, EventInput, EventMode, EventPatch};
use crate::validation::{normalize_and_validate, ValidationError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid event: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Runs every write through the normalization pipeline before it reaches the
/// store.
pub struct EventService {
    store: Store,
}

impl EventService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn create_event(&self, input: EventInput) -> ServiceResult<Event> {
        let record =
            normalize_and_validate(EventCandidate::new(input), true, &ChangedFields::new())?;
        Ok(self.store.create(&record)?)
    }

    pub fn update_event(&self, id: &str, patch: EventPatch) -> ServiceResult<Event> {
        let current = self.store.get_event(id)?;
        let mut candidate = EventCandidate::from_event(&current);
        let changed = candidate.apply_patch(patch);
        debug!("updating event {id}, changed fields: {changed:?}");

        let record = normalize_and_validate(candidate, false, &changed)?;
        Ok(self.store.update(id, &record)?)
    }

    pub fn get_event(&self, id: &str) -> ServiceResult<Event> {
        Ok(self.store.get_event(id)?)
    }

    pub fn get_event_by_slug(&self, slug: &str) -> ServiceResult<Option<Event>> {
        Ok(self.store.find_by_slug(slug)?)
    }

    /// Upcoming events for the landing page, soonest first.
    pub fn featured_events(&self, today: NaiveDate, limit: usize) -> ServiceResult<Vec<Event>> {
        let from = today.format("%Y-%m-%d").to_string();
        Ok(self.store.list_upcoming(&from, limit)?)
    }

    pub fn events_by_mode(&self, mode: EventMode) -> ServiceResult<Vec<Event>> {
        Ok(self.store.list_by_mode(mode)?)
    }

    /// Fills an empty store with the sample events; returns how many were
    /// written.
    pub fn seed_if_empty(&self) -> ServiceResult<usize> {
        if self.store.count()? > 0 {
            return Ok(0);
        }

        let samples = sample_events();
        let total = samples.len();
        for input in samples {
            self.create_event(input)?;
        }
        info!("seeded {total} sample events");
        Ok(total)
    }
}

fn sample_events() -> Vec<EventInput> {
    vec![
        sample(
            "React Summit US 2025",
            "The biggest React conference worldwide, with talks on server components, tooling and performance.",
            "A two-day React conference for frontend engineers.",
            "/images/event1.png",
            "Liberty Science Center",
            "Jersey City, NJ",
            "November 18, 2025",
            "9:00 AM",
            "hybrid",
            "Frontend developers and React engineers",
            &["Keynote", "Server components deep dive", "Panel: the future of React"],
            "GitNation",
            &["react", "frontend", "conference"],
        ),
        sample(
            "KubeCon + CloudNativeCon Europe 2026",
            "The Cloud Native Computing Foundation's flagship conference for Kubernetes and cloud native adopters.",
            "Cloud native talks, maintainer tracks and hands-on labs.",
            "/images/event2.png",
            "RAI Amsterdam",
            "Amsterdam, Netherlands",
            "2026-03-23",
            "8:30 AM",
            "offline",
            "Platform engineers and SREs",
            &["Opening keynote", "Maintainer track", "Hallway track"],
            "CNCF",
            &["kubernetes", "cloud", "devops"],
        ),
        sample(
            "Open Source Hack Night",
            "A remote evening of pairing on good-first-issues across popular open source projects.",
            "Ship your first open source pull request.",
            "/images/event3.png",
            "Discord",
            "Online",
            "2026-01-15",
            "6:00 PM",
            "online",
            "Students and early-career developers",
            &["Project pitches", "Pairing sessions", "Demos"],
            "Dev Event Hub",
            &["open-source", "hackathon"],
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn sample(
    title: &str,
    description: &str,
    overview: &str,
    image: &str,
    venue: &str,
    location: &str,
    date: &str,
    time: &str,
    mode: &str,
    audience: &str,
    agenda: &[&str],
    organizer: &str,
    tags: &[&str],
) -> EventInput {
    EventInput {
        title: title.to_string(),
        description: description.to_string(),
        overview: overview.to_string(),
        image: image.to_string(),
        venue: venue.to_string(),
        location: location.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        mode: mode.to_string(),
        audience: audience.to_string(),
        agenda: agenda.iter().map(|s| s.to_string()).collect(),
        organizer: organizer.to_string(),
        tags: tags.iter().map(|s| s.to_string()).collect(),
    }
}
