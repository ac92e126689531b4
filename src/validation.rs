use thiserror::Error;

use crate::models::{ChangedFields, EventCandidate, EventField, EventMode, NormalizedEvent};
use crate::normalize::{derive_slug, normalize_date, normalize_time};

/// Length limits count Unicode scalar values, not UTF-16 code units, so a
/// character outside the BMP (most emoji) counts once.
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 1000;
pub const OVERVIEW_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    RequiredFieldMissing { field: EventField },
    #[error("{field} must be at most {max} characters (got {actual})")]
    FieldTooLong {
        field: EventField,
        max: usize,
        actual: usize,
    },
    #[error("mode must be one of online, offline or hybrid (got `{value}`)")]
    InvalidMode { value: String },
    #[error("at least one {field} item is required")]
    EmptyCollection { field: EventField },
    #[error("invalid date format: `{value}`")]
    InvalidDateFormat { value: String },
    #[error("invalid time format: `{value}`. Use HH:MM or HH:MM AM/PM")]
    InvalidTimeFormat { value: String },
    #[error("invalid hour value: {hour}")]
    InvalidHourValue { hour: u32 },
}

impl ValidationError {
    /// The field the failure is reported against.
    pub fn field(&self) -> EventField {
        match self {
            ValidationError::RequiredFieldMissing { field }
            | ValidationError::FieldTooLong { field, .. }
            | ValidationError::EmptyCollection { field } => *field,
            ValidationError::InvalidMode { .. } => EventField::Mode,
            ValidationError::InvalidDateFormat { .. } => EventField::Date,
            ValidationError::InvalidTimeFormat { .. } | ValidationError::InvalidHourValue { .. } => {
                EventField::Time
            }
        }
    }
}

/// Runs the pre-write pipeline over a candidate record.
///
/// Text fields are trimmed, then checked in a fixed order (required fields,
/// length limits, mode, agenda/tags, date, time) and the first failure is
/// returned. The slug is re-derived on creation or when the title changed;
/// date and time are re-normalized on creation or when they changed. A new
/// record treats every field as changed, so `changed_fields` is ignored.
pub fn normalize_and_validate(
    candidate: EventCandidate,
    is_new_record: bool,
    changed_fields: &ChangedFields,
) -> Result<NormalizedEvent, ValidationError> {
    let touched = |field: EventField| is_new_record || changed_fields.contains(&field);
    let stored_slug = candidate.stored_slug().map(str::to_string);
    let input = candidate.fields;

    let title = input.title.trim().to_string();
    let description = input.description.trim().to_string();
    let overview = input.overview.trim().to_string();
    let image = input.image.trim().to_string();
    let venue = input.venue.trim().to_string();
    let location = input.location.trim().to_string();
    let audience = input.audience.trim().to_string();
    let organizer = input.organizer.trim().to_string();

    let required = [
        (EventField::Title, title.as_str()),
        (EventField::Description, description.as_str()),
        (EventField::Overview, overview.as_str()),
        (EventField::Image, image.as_str()),
        (EventField::Venue, venue.as_str()),
        (EventField::Location, location.as_str()),
        (EventField::Date, input.date.trim()),
        (EventField::Time, input.time.trim()),
        (EventField::Mode, input.mode.as_str()),
        (EventField::Audience, audience.as_str()),
        (EventField::Organizer, organizer.as_str()),
    ];
    for (field, value) in required {
        if value.is_empty() {
            return Err(ValidationError::RequiredFieldMissing { field });
        }
    }

    let limits = [
        (EventField::Title, title.as_str(), TITLE_MAX_CHARS),
        (
            EventField::Description,
            description.as_str(),
            DESCRIPTION_MAX_CHARS,
        ),
        (EventField::Overview, overview.as_str(), OVERVIEW_MAX_CHARS),
    ];
    for (field, value, max) in limits {
        let actual = value.chars().count();
        if actual > max {
            return Err(ValidationError::FieldTooLong { field, max, actual });
        }
    }

    let mode = input
        .mode
        .parse::<EventMode>()
        .map_err(|_| ValidationError::InvalidMode {
            value: input.mode.clone(),
        })?;

    if input.agenda.is_empty() {
        return Err(ValidationError::EmptyCollection {
            field: EventField::Agenda,
        });
    }
    if input.tags.is_empty() {
        return Err(ValidationError::EmptyCollection {
            field: EventField::Tags,
        });
    }

    let date = if touched(EventField::Date) {
        normalize_date(&input.date)?
    } else {
        input.date
    };
    let time = if touched(EventField::Time) {
        normalize_time(&input.time)?
    } else {
        input.time
    };

    let slug = match stored_slug {
        Some(existing) if !touched(EventField::Title) => existing,
        _ => derive_slug(&title),
    };

    Ok(NormalizedEvent {
        title,
        slug,
        description,
        overview,
        image,
        venue,
        location,
        date,
        time,
        mode,
        audience,
        agenda: input.agenda,
        organizer,
        tags: input.tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, EventInput, EventPatch};
    use chrono::Utc;

    fn sample_input() -> EventInput {
        EventInput {
            title: "  Dev Conf 2025!!  ".to_string(),
            description: "Two days of talks on tooling, testing and deployment.".to_string(),
            overview: "The yearly developer conference.".to_string(),
            image: " /images/event1.png ".to_string(),
            venue: "Moscone Center".to_string(),
            location: "San Francisco, CA".to_string(),
            date: "March 5, 2025".to_string(),
            time: "2:30 PM".to_string(),
            mode: "hybrid".to_string(),
            audience: "Developers".to_string(),
            agenda: vec!["Keynote".to_string(), "Workshops".to_string()],
            organizer: "Dev Conf Org".to_string(),
            tags: vec!["conference".to_string(), "web".to_string()],
        }
    }

    fn validate_new(input: EventInput) -> Result<NormalizedEvent, ValidationError> {
        normalize_and_validate(EventCandidate::new(input), true, &ChangedFields::new())
    }

    fn stored(record: NormalizedEvent) -> Event {
        Event {
            id: "evt-1".to_string(),
            record,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn normalizes_a_new_record() {
        let record = validate_new(sample_input()).expect("valid record");
        assert_eq!(record.title, "Dev Conf 2025!!");
        assert_eq!(record.slug, "dev-conf-2025");
        assert_eq!(record.image, "/images/event1.png");
        assert_eq!(record.date, "2025-03-05");
        assert_eq!(record.time, "14:30");
        assert_eq!(record.mode, EventMode::Hybrid);
    }

    #[test]
    fn empty_agenda_is_rejected() {
        let mut input = sample_input();
        input.agenda.clear();
        let err = validate_new(input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyCollection {
                field: EventField::Agenda
            }
        );
        assert_eq!(err.field(), EventField::Agenda);
    }

    #[test]
    fn empty_tags_are_rejected() {
        let mut input = sample_input();
        input.tags.clear();
        assert_eq!(
            validate_new(input).unwrap_err(),
            ValidationError::EmptyCollection {
                field: EventField::Tags
            }
        );
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut input = sample_input();
        input.mode = "virtual".to_string();
        let err = validate_new(input).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidMode {
                value: "virtual".to_string()
            }
        );
        assert_eq!(err.field(), EventField::Mode);
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let mut input = sample_input();
        input.venue = "   ".to_string();
        assert_eq!(
            validate_new(input).unwrap_err(),
            ValidationError::RequiredFieldMissing {
                field: EventField::Venue
            }
        );
    }

    #[test]
    fn length_limits_apply_after_trimming() {
        let mut input = sample_input();
        input.title = format!("  {}  ", "a".repeat(TITLE_MAX_CHARS));
        assert!(validate_new(input).is_ok());

        let mut input = sample_input();
        input.overview = "é".repeat(OVERVIEW_MAX_CHARS + 1);
        assert_eq!(
            validate_new(input).unwrap_err(),
            ValidationError::FieldTooLong {
                field: EventField::Overview,
                max: OVERVIEW_MAX_CHARS,
                actual: OVERVIEW_MAX_CHARS + 1,
            }
        );
    }

    #[test]
    fn length_counts_characters_not_utf16_units() {
        let mut input = sample_input();
        input.title = "🦀".repeat(60);
        assert!(validate_new(input).is_ok());

        let mut input = sample_input();
        input.title = "🦀".repeat(TITLE_MAX_CHARS + 1);
        assert_eq!(
            validate_new(input).unwrap_err(),
            ValidationError::FieldTooLong {
                field: EventField::Title,
                max: TITLE_MAX_CHARS,
                actual: TITLE_MAX_CHARS + 1,
            }
        );
    }

    #[test]
    fn failures_are_reported_in_fixed_order() {
        let mut input = sample_input();
        input.description = "d".repeat(DESCRIPTION_MAX_CHARS + 1);
        input.mode = "virtual".to_string();
        input.agenda.clear();
        input.date = "not-a-date".to_string();
        input.time = "2:3 PM".to_string();
        assert!(matches!(
            validate_new(input.clone()).unwrap_err(),
            ValidationError::FieldTooLong {
                field: EventField::Description,
                ..
            }
        ));

        input.description = "fine".to_string();
        assert!(matches!(
            validate_new(input.clone()).unwrap_err(),
            ValidationError::InvalidMode { .. }
        ));

        input.mode = "online".to_string();
        assert!(matches!(
            validate_new(input.clone()).unwrap_err(),
            ValidationError::EmptyCollection { .. }
        ));

        input.agenda = vec!["Intro".to_string()];
        assert!(matches!(
            validate_new(input.clone()).unwrap_err(),
            ValidationError::InvalidDateFormat { .. }
        ));

        input.date = "2025-03-05".to_string();
        assert!(matches!(
            validate_new(input).unwrap_err(),
            ValidationError::InvalidTimeFormat { .. }
        ));
    }

    #[test]
    fn bad_hour_reports_against_time() {
        let mut input = sample_input();
        input.time = "25:00".to_string();
        let err = validate_new(input).unwrap_err();
        assert_eq!(err, ValidationError::InvalidHourValue { hour: 25 });
        assert_eq!(err.field(), EventField::Time);
    }

    #[test]
    fn unchanged_title_keeps_the_stored_slug() {
        let mut record = validate_new(sample_input()).expect("valid record");
        record.slug = "dev-conf-2025-sf".to_string();
        let event = stored(record);

        let mut candidate = EventCandidate::from_event(&event);
        let changed = candidate.apply_patch(EventPatch {
            venue: Some("Pier 48".to_string()),
            description: Some("Updated lineup".to_string()),
            ..EventPatch::default()
        });
        let updated = normalize_and_validate(candidate, false, &changed).expect("valid update");

        assert_eq!(updated.slug, "dev-conf-2025-sf");
        assert_eq!(updated.venue, "Pier 48");
    }

    #[test]
    fn changed_title_rederives_the_slug() {
        let event = stored(validate_new(sample_input()).expect("valid record"));
        let mut candidate = EventCandidate::from_event(&event);
        let changed = candidate.apply_patch(EventPatch {
            title: Some("Dev Conf 2026".to_string()),
            ..EventPatch::default()
        });
        let updated = normalize_and_validate(candidate, false, &changed).expect("valid update");
        assert_eq!(updated.slug, "dev-conf-2026");
    }

    #[test]
    fn untouched_date_and_time_are_not_renormalized() {
        let event = stored(validate_new(sample_input()).expect("valid record"));
        let mut candidate = EventCandidate::from_event(&event);
        candidate.fields.time = "not a time".to_string();
        let changed = ChangedFields::from([EventField::Venue]);

        let updated = normalize_and_validate(candidate, false, &changed).expect("valid update");
        assert_eq!(updated.time, "not a time");
        assert_eq!(updated.date, "2025-03-05");
    }

    #[test]
    fn changed_time_is_renormalized() {
        let event = stored(validate_new(sample_input()).expect("valid record"));
        let mut candidate = EventCandidate::from_event(&event);
        let changed = candidate.apply_patch(EventPatch {
            time: Some("12:00 AM".to_string()),
            ..EventPatch::default()
        });
        let updated = normalize_and_validate(candidate, false, &changed).expect("valid update");
        assert_eq!(updated.time, "00:00");
    }

    #[test]
    fn new_records_ignore_changed_fields() {
        let changed = ChangedFields::from([EventField::Venue]);
        let record = normalize_and_validate(EventCandidate::new(sample_input()), true, &changed)
            .expect("valid record");
        assert_eq!(record.slug, "dev-conf-2025");
        assert_eq!(record.time, "14:30");
    }
}
