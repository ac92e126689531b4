use std::{collections::HashSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventMode {
    Online,
    Offline,
    Hybrid,
}

impl EventMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventMode::Online => "online",
            EventMode::Offline => "offline",
            EventMode::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for EventMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event mode `{0}` (expected online, offline or hybrid)")]
pub struct UnknownMode(pub String);

impl FromStr for EventMode {
    type Err = UnknownMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "online" => Ok(EventMode::Online),
            "offline" => Ok(EventMode::Offline),
            "hybrid" => Ok(EventMode::Hybrid),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Caller-settable fields of an event. `slug` and the timestamps are not
/// listed because nothing outside the pipeline may write them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum EventField {
    Title,
    Description,
    Overview,
    Image,
    Venue,
    Location,
    Date,
    Time,
    Mode,
    Audience,
    Agenda,
    Organizer,
    Tags,
}

impl EventField {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventField::Title => "title",
            EventField::Description => "description",
            EventField::Overview => "overview",
            EventField::Image => "image",
            EventField::Venue => "venue",
            EventField::Location => "location",
            EventField::Date => "date",
            EventField::Time => "time",
            EventField::Mode => "mode",
            EventField::Audience => "audience",
            EventField::Agenda => "agenda",
            EventField::Organizer => "organizer",
            EventField::Tags => "tags",
        }
    }
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type ChangedFields = HashSet<EventField>;

/// Raw payload for a new event, as a caller submits it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: String,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub overview: Option<String>,
    pub image: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub mode: Option<String>,
    pub audience: Option<String>,
    pub agenda: Option<Vec<String>>,
    pub organizer: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// A record on its way into the store: the proposed field values plus the
/// slug already on disk, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventCandidate {
    pub fields: EventInput,
    stored_slug: Option<String>,
}

impl EventCandidate {
    pub fn new(fields: EventInput) -> Self {
        Self {
            fields,
            stored_slug: None,
        }
    }

    pub fn from_event(event: &Event) -> Self {
        let record = &event.record;
        Self {
            fields: EventInput {
                title: record.title.clone(),
                description: record.description.clone(),
                overview: record.overview.clone(),
                image: record.image.clone(),
                venue: record.venue.clone(),
                location: record.location.clone(),
                date: record.date.clone(),
                time: record.time.clone(),
                mode: record.mode.as_str().to_string(),
                audience: record.audience.clone(),
                agenda: record.agenda.clone(),
                organizer: record.organizer.clone(),
                tags: record.tags.clone(),
            },
            stored_slug: Some(record.slug.clone()),
        }
    }

    pub fn stored_slug(&self) -> Option<&str> {
        self.stored_slug.as_deref()
    }

    /// Merges `patch` into the candidate and reports which fields now hold a
    /// different value. Setting a field to its current value is not a change.
    pub fn apply_patch(&mut self, patch: EventPatch) -> ChangedFields {
        let mut changed = ChangedFields::new();
        let fields = &mut self.fields;

        merge(&mut fields.title, patch.title, EventField::Title, &mut changed);
        merge(
            &mut fields.description,
            patch.description,
            EventField::Description,
            &mut changed,
        );
        merge(
            &mut fields.overview,
            patch.overview,
            EventField::Overview,
            &mut changed,
        );
        merge(&mut fields.image, patch.image, EventField::Image, &mut changed);
        merge(&mut fields.venue, patch.venue, EventField::Venue, &mut changed);
        merge(
            &mut fields.location,
            patch.location,
            EventField::Location,
            &mut changed,
        );
        merge(&mut fields.date, patch.date, EventField::Date, &mut changed);
        merge(&mut fields.time, patch.time, EventField::Time, &mut changed);
        merge(&mut fields.mode, patch.mode, EventField::Mode, &mut changed);
        merge(
            &mut fields.audience,
            patch.audience,
            EventField::Audience,
            &mut changed,
        );
        merge(&mut fields.agenda, patch.agenda, EventField::Agenda, &mut changed);
        merge(
            &mut fields.organizer,
            patch.organizer,
            EventField::Organizer,
            &mut changed,
        );
        merge(&mut fields.tags, patch.tags, EventField::Tags, &mut changed);

        changed
    }
}

fn merge<T: PartialEq>(
    current: &mut T,
    proposed: Option<T>,
    field: EventField,
    changed: &mut ChangedFields,
) {
    if let Some(value) = proposed {
        if *current != value {
            *current = value;
            changed.insert(field);
        }
    }
}

/// A record that passed the pipeline and may be written as-is.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String, // YYYY-MM-DD
    pub time: String, // HH:MM, 24h
    pub mode: EventMode,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(flatten)]
    pub record: NormalizedEvent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn slug(&self) -> &str {
        &self.record.slug
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }
}
