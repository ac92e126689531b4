use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::validation::ValidationError;

static SLUG_DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug filter regex"));
static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static HYPHEN_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));
// `YYYY` or `YYYY-MM`; the missing parts default to 1.
static REDUCED_ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})(?:-([0-9]{2}))?$").expect("valid reduced date regex"));
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([0-9]{1,2}):([0-9]{2})(?:\s*(am|pm))?$").expect("valid time regex")
});

const DATE_FORMATS: [&str; 13] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%A %B %d, %Y",
    "%A, %d %B %Y",
    "%a %b %d %Y",
    "%b. %d, %Y",
    "%Y %B %d",
];

const DATETIME_FORMATS: [&str; 10] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d %Y %I:%M %p",
    "%B %d %Y %H:%M",
    "%d %B %Y %H:%M",
];

// `%#z` takes `Z`, `+HH:MM` and `+HHMM`.
const OFFSET_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Builds the URL slug for a title: lowercase ASCII letters, digits and
/// single hyphens, never starting or ending with a hyphen.
pub fn derive_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let filtered = SLUG_DISALLOWED_RE.replace_all(lowered.trim(), "");
    let hyphenated = WHITESPACE_RUN_RE.replace_all(&filtered, "-");
    let collapsed = HYPHEN_RUN_RE.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Rewrites a free-form date as `YYYY-MM-DD`. Values carrying an offset are
/// moved to UTC first; everything else is read as a UTC calendar date.
pub fn normalize_date(input: &str) -> Result<String, ValidationError> {
    let date = parse_calendar_date(input.trim()).ok_or_else(|| {
        ValidationError::InvalidDateFormat {
            value: input.to_string(),
        }
    })?;
    Ok(date.format("%Y-%m-%d").to_string())
}

/// Rewrites `H:MM`, `HH:MM` or either followed by AM/PM as 24-hour `HH:MM`.
/// Minutes are carried over exactly as written.
pub fn normalize_time(input: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::InvalidTimeFormat {
        value: input.to_string(),
    };
    let caps = TIME_RE.captures(input.trim()).ok_or_else(invalid)?;

    let mut hour: u32 = caps
        .get(1)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(invalid)?;
    let minutes = caps.get(2).map(|m| m.as_str()).ok_or_else(invalid)?;
    let period = caps.get(3).map(|m| m.as_str().to_ascii_uppercase());

    match period.as_deref() {
        Some("PM") if hour != 12 => hour += 12,
        Some("AM") if hour == 12 => hour = 0,
        _ => {}
    }

    if hour > 23 {
        return Err(ValidationError::InvalidHourValue { hour });
    }

    Ok(format!("{:02}:{}", hour, minutes))
}

fn parse_calendar_date(input: &str) -> Option<NaiveDate> {
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for fmt in OFFSET_DATETIME_FORMATS.iter() {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(input, fmt) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }

    if let Some(caps) = REDUCED_ISO_DATE_RE.captures(input) {
        let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
        let month = match caps.get(2) {
            Some(m) => m.as_str().parse::<u32>().ok()?,
            None => 1,
        };
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    for fmt in DATETIME_FORMATS.iter() {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return Some(naive.date());
        }
    }

    for fmt in DATE_FORMATS.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(input, fmt) {
            return Some(date);
        }
    }

    None
}
