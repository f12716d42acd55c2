//! Domain error types for the event classifier and event validation.
//!
//! Application layers wrap these in `anyhow` with context; the classifier
//! itself only ever returns [`ScheduleError`].

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while turning an event's date and time into an instant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// The event's time is present but is not `HH:MM` with a valid hour and minute.
    #[error("invalid time format '{raw}': expected HH:MM between 00:00 and 23:59")]
    InvalidTimeFormat {
        /// The rejected input.
        raw: String,
    },

    /// The event's date is missing or cannot be parsed.
    #[error("invalid date '{raw}': expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input.
        raw: String,
    },

    /// The wall-clock date and time fall into a DST gap of the zone.
    #[error("local time {date} {time} does not exist in timezone {timezone}")]
    NonexistentLocalTime {
        date: NaiveDate,
        time: String,
        timezone: String,
    },
}

/// Form-level rules applied before an event is stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must be at least {min} characters")]
    TitleTooShort { min: usize },

    #[error("description must be at least {min} characters")]
    DescriptionTooShort { min: usize },

    #[error("address must be at least {min} characters")]
    AddressTooShort { min: usize },

    #[error("event date {date} is in the past (today is {today})")]
    DateInPast { date: NaiveDate, today: NaiveDate },

    #[error("unknown event type '{raw}': expected Outreach, Worship, Training or Community")]
    UnknownKind { raw: String },

    #[error("latitude and longitude must be given together")]
    PartialCoordinates,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_time_display_includes_input() {
        let err = ScheduleError::InvalidTimeFormat {
            raw: "25:99".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid time format '25:99': expected HH:MM between 00:00 and 23:59"
        );
    }

    #[test]
    fn invalid_date_display_includes_input() {
        let err = ScheduleError::InvalidDate {
            raw: "2024-13-01".to_string(),
        };
        assert_eq!(err.to_string(), "invalid date '2024-13-01': expected YYYY-MM-DD");
    }

    #[test]
    fn validation_wraps_schedule_error_transparently() {
        let err: ValidationError = ScheduleError::InvalidTimeFormat {
            raw: "7pm".to_string(),
        }
        .into();
        assert!(err.to_string().starts_with("invalid time format '7pm'"));
    }

    #[test]
    fn date_in_past_mentions_both_dates() {
        let err = ValidationError::DateInPast {
            date: NaiveDate::from_ymd_opt(2024, 7, 1).expect("valid date"),
            today: NaiveDate::from_ymd_opt(2024, 7, 20).expect("valid date"),
        };
        assert_eq!(
            err.to_string(),
            "event date 2024-07-01 is in the past (today is 2024-07-20)"
        );
    }
}
