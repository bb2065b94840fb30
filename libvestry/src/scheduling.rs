//! Scheduling and time parsing utilities
//!
//! Slot suggestion, IANA timezone validation, and parsing of human-readable
//! time formats for scheduling posts.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};

use crate::error::{Result, VestryError};

/// Suggest the next available publishing slot
///
/// Returns now + 24h truncated to the top of the hour, in the caller's
/// timezone. A placeholder heuristic: no cross-post collision detection is
/// performed.
pub fn suggest_next_available_slot<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Tz> {
    let slot = now + Duration::hours(24);
    slot.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(slot)
}

/// Check that a timezone is a known IANA name
///
/// # Errors
///
/// Returns `Validation` for unknown names.
pub fn validate_timezone(name: &str) -> Result<chrono_tz::Tz> {
    name.parse::<chrono_tz::Tz>()
        .map_err(|_| VestryError::Validation(format!("Unknown timezone: {}", name)))
}

/// Parse a schedule string into a DateTime
///
/// Supports relative durations ("1h", "30m", "2d") and natural language
/// ("tomorrow", "next friday 10am").
///
/// # Errors
///
/// Returns `Validation` if the string is empty or cannot be parsed.
pub fn parse_schedule(input: &str) -> Result<DateTime<Utc>> {
    if input.is_empty() {
        return Err(VestryError::Validation(
            "Schedule string cannot be empty".to_string(),
        ));
    }

    if let Ok(duration) = parse_duration(input) {
        return Ok(Utc::now() + duration);
    }

    if let Ok(dt) = parse_natural_language(input) {
        return Ok(dt);
    }

    Err(VestryError::Validation(format!(
        "Could not parse schedule string: {}",
        input
    )))
}

fn parse_duration(input: &str) -> Result<Duration> {
    if let Ok(std_duration) = humantime::parse_duration(input) {
        let seconds = std_duration.as_secs() as i64;
        return Duration::try_seconds(seconds)
            .ok_or_else(|| VestryError::Validation("Duration out of range".to_string()));
    }

    Err(VestryError::Validation(format!(
        "Could not parse duration: {}",
        input
    )))
}

fn parse_natural_language(input: &str) -> Result<DateTime<Utc>> {
    chrono_english::parse_date_string(input, Utc::now(), chrono_english::Dialect::Us)
        .map_err(|e| VestryError::Validation(format!("Could not parse time: {}", e)))
}
