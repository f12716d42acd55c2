use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ScheduleError, ValidationError};

pub const MIN_TITLE_LEN: usize = 3;
pub const MIN_DESCRIPTION_LEN: usize = 10;
pub const MIN_ADDRESS_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventKind {
    Outreach,
    Worship,
    Training,
    Community,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outreach => "Outreach",
            Self::Worship => "Worship",
            Self::Training => "Training",
            Self::Community => "Community",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outreach" => Ok(Self::Outreach),
            "worship" => Ok(Self::Worship),
            "training" => Ok(Self::Training),
            "community" => Ok(Self::Community),
            _ => Err(ValidationError::UnknownKind { raw: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,

    pub date: NaiveDate,

    /// `HH:MM`, 24-hour. `None` marks an all-day event.
    #[serde(default)]
    pub time: Option<String>,

    pub title: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: EventKind,

    #[serde(default)]
    pub lat: Option<f64>,

    #[serde(default)]
    pub lng: Option<f64>,
}

impl Event {
    pub fn is_all_day(&self) -> bool {
        self.time.is_none()
    }

    /// Parsed time of day, `None` for all-day events.
    pub fn clock_time(&self) -> Result<Option<NaiveTime>, ScheduleError> {
        self.time.as_deref().map(parse_clock_time).transpose()
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }
}

/// Raw event input as it arrives from the command line or an import file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl NewEvent {
    /// Form rules, including that the event is not dated before `today`.
    pub fn validate(self, today: NaiveDate) -> Result<Event, ValidationError> {
        self.validate_inner(Some(today))
    }

    /// Same rules, but any date is accepted. Used for historical imports.
    pub fn validate_record(self) -> Result<Event, ValidationError> {
        self.validate_inner(None)
    }

    #[tracing::instrument(skip(self), fields(title = %self.title))]
    fn validate_inner(self, not_before: Option<NaiveDate>) -> Result<Event, ValidationError> {
        let title = self.title.trim().to_string();
        if title.chars().count() < MIN_TITLE_LEN {
            return Err(ValidationError::TitleTooShort { min: MIN_TITLE_LEN });
        }

        let description = self.description.trim().to_string();
        if description.chars().count() < MIN_DESCRIPTION_LEN {
            return Err(ValidationError::DescriptionTooShort {
                min: MIN_DESCRIPTION_LEN,
            });
        }

        let address = self.address.trim().to_string();
        if address.chars().count() < MIN_ADDRESS_LEN {
            return Err(ValidationError::AddressTooShort {
                min: MIN_ADDRESS_LEN,
            });
        }

        let date = parse_event_date(&self.date)?;
        if let Some(today) = not_before
            && date < today
        {
            return Err(ValidationError::DateInPast { date, today });
        }

        let time = match self.time.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                parse_clock_time(raw)?;
                Some(raw.to_string())
            }
        };

        let kind = self.kind.parse::<EventKind>()?;

        if self.lat.is_some() != self.lng.is_some() {
            return Err(ValidationError::PartialCoordinates);
        }

        Ok(Event {
            id: Uuid::new_v4(),
            date,
            time,
            title,
            address,
            description,
            kind,
            lat: self.lat,
            lng: self.lng,
        })
    }
}

pub fn parse_event_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::InvalidDate {
            raw: raw.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| ScheduleError::InvalidDate {
        raw: raw.to_string(),
    })
}

fn clock_re() -> Option<&'static Regex> {
    static CLOCK_RE: OnceLock<Option<Regex>> = OnceLock::new();
    CLOCK_RE
        .get_or_init(|| Regex::new(r"^(?P<hour>\d{2}):(?P<minute>\d{2})$").ok())
        .as_ref()
}

/// Strict `HH:MM` 24-hour parser. Anything else is rejected, including `9:05`.
pub fn parse_clock_time(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidTimeFormat {
        raw: raw.to_string(),
    };

    let captures = clock_re().and_then(|re| re.captures(raw)).ok_or_else(invalid)?;
    let hour = captures
        .name("hour")
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(invalid)?;
    let minute = captures
        .name("minute")
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .ok_or_else(invalid)?;

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 20).expect("valid date")
    }

    fn form() -> NewEvent {
        NewEvent {
            title: "Courthouse Outreach".to_string(),
            date: "2024-07-21".to_string(),
            time: Some("11:00".to_string()),
            address: "4110 Chain Bridge Rd, Fairfax, VA 22030".to_string(),
            description: "Handing out tracts near the courthouse.".to_string(),
            kind: "Outreach".to_string(),
            lat: None,
            lng: None,
        }
    }

    #[test]
    fn parses_valid_clock_times() {
        assert_eq!(
            parse_clock_time("09:05").expect("parse"),
            NaiveTime::from_hms_opt(9, 5, 0).expect("valid time")
        );
        assert_eq!(
            parse_clock_time("23:59").expect("parse"),
            NaiveTime::from_hms_opt(23, 59, 0).expect("valid time")
        );
        assert_eq!(
            parse_clock_time("00:00").expect("parse"),
            NaiveTime::from_hms_opt(0, 0, 0).expect("valid time")
        );
    }

    #[test]
    fn rejects_out_of_range_and_malformed_times() {
        for raw in ["25:99", "24:00", "12:60", "9:05", "0905", "", "3:00 PM", " 09:05"] {
            assert_eq!(
                parse_clock_time(raw),
                Err(ScheduleError::InvalidTimeFormat {
                    raw: raw.to_string()
                }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn validates_a_complete_form() {
        let event = form().validate(today()).expect("valid form");
        assert_eq!(event.title, "Courthouse Outreach");
        assert_eq!(event.time.as_deref(), Some("11:00"));
        assert_eq!(event.kind, EventKind::Outreach);
        assert!(!event.is_all_day());
    }

    #[test]
    fn blank_time_means_all_day() {
        let mut raw = form();
        raw.time = Some("  ".to_string());
        let event = raw.validate(today()).expect("valid form");
        assert!(event.is_all_day());
        assert_eq!(event.clock_time().expect("no time"), None);
    }

    #[test]
    fn rejects_short_fields() {
        let mut raw = form();
        raw.title = "Hi".to_string();
        assert_eq!(
            raw.validate(today()),
            Err(ValidationError::TitleTooShort { min: 3 })
        );

        let mut raw = form();
        raw.description = "short".to_string();
        assert_eq!(
            raw.validate(today()),
            Err(ValidationError::DescriptionTooShort { min: 10 })
        );

        let mut raw = form();
        raw.address = "Here".to_string();
        assert_eq!(
            raw.validate(today()),
            Err(ValidationError::AddressTooShort { min: 5 })
        );
    }

    #[test]
    fn rejects_past_dates_but_allows_today() {
        let mut raw = form();
        raw.date = "2024-07-19".to_string();
        assert!(matches!(
            raw.validate(today()),
            Err(ValidationError::DateInPast { .. })
        ));

        let mut raw = form();
        raw.date = "2024-07-20".to_string();
        assert!(raw.validate(today()).is_ok());
    }

    #[test]
    fn record_validation_accepts_past_dates() {
        let mut raw = form();
        raw.date = "2023-01-01".to_string();
        let event = raw.validate_record().expect("historical record");
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date"));
    }

    #[test]
    fn rejects_malformed_date_and_time() {
        let mut raw = form();
        raw.date = "07/21/2024".to_string();
        assert_eq!(
            raw.validate(today()),
            Err(ValidationError::Schedule(ScheduleError::InvalidDate {
                raw: "07/21/2024".to_string()
            }))
        );

        let mut raw = form();
        raw.time = Some("25:99".to_string());
        assert_eq!(
            raw.validate(today()),
            Err(ValidationError::Schedule(ScheduleError::InvalidTimeFormat {
                raw: "25:99".to_string()
            }))
        );
    }

    #[test]
    fn rejects_unknown_kind_and_half_coordinates() {
        let mut raw = form();
        raw.kind = "Picnic".to_string();
        assert!(matches!(
            raw.validate(today()),
            Err(ValidationError::UnknownKind { .. })
        ));

        let mut raw = form();
        raw.lat = Some(38.8463);
        assert_eq!(
            raw.validate(today()),
            Err(ValidationError::PartialCoordinates)
        );
    }

    #[test]
    fn event_serializes_kind_as_type() {
        let event = form().validate(today()).expect("valid form");
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "Outreach");
        assert_eq!(json["date"], "2024-07-21");
    }
}
