//! Locale-specific rendering of dates and relative-day labels.
//!
//! Classification never depends on the locale; only the final strings do.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Tomorrow,
    Yesterday,
}

impl Locale {
    pub fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn formatter(self) -> &'static dyn DateFormatter {
        match self {
            Self::En => &English,
            Self::Es => &Spanish,
        }
    }

    /// Falls back to English for anything unrecognised.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|err| {
            tracing::warn!(locale = %raw, error = %err, "unsupported locale; using en");
            Self::En
        })
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let language = normalized.split('-').next().unwrap_or_default();
        match language {
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            _ => Err(anyhow!("unsupported locale: {s}")),
        }
    }
}

pub trait DateFormatter: Send + Sync {
    /// Short numeric calendar date, e.g. `7/20/2024`.
    fn numeric_date(&self, date: NaiveDate) -> String;

    /// Weekday, month, day and year with no time component.
    fn long_date(&self, date: NaiveDate) -> String;

    fn relative_day(&self, day: RelativeDay) -> &'static str;

    /// Joins a day label and a clock string: `{label} at {time}`.
    fn at_time(&self, label: &str, time: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct English;

#[derive(Debug, Clone, Copy, Default)]
pub struct Spanish;

impl DateFormatter for English {
    fn numeric_date(&self, date: NaiveDate) -> String {
        format!("{}/{}/{}", date.month(), date.day(), date.year())
    }

    fn long_date(&self, date: NaiveDate) -> String {
        format!(
            "{}, {} {}, {}",
            english_weekday(date.weekday()),
            ENGLISH_MONTHS[date.month0() as usize],
            date.day(),
            date.year()
        )
    }

    fn relative_day(&self, day: RelativeDay) -> &'static str {
        match day {
            RelativeDay::Today => "Today",
            RelativeDay::Tomorrow => "Tomorrow",
            RelativeDay::Yesterday => "Yesterday",
        }
    }

    fn at_time(&self, label: &str, time: &str) -> String {
        format!("{label} at {time}")
    }
}

impl DateFormatter for Spanish {
    fn numeric_date(&self, date: NaiveDate) -> String {
        format!("{}/{}/{}", date.day(), date.month(), date.year())
    }

    fn long_date(&self, date: NaiveDate) -> String {
        format!(
            "{}, {} de {} de {}",
            spanish_weekday(date.weekday()),
            date.day(),
            SPANISH_MONTHS[date.month0() as usize],
            date.year()
        )
    }

    fn relative_day(&self, day: RelativeDay) -> &'static str {
        match day {
            RelativeDay::Today => "Hoy",
            RelativeDay::Tomorrow => "Mañana",
            RelativeDay::Yesterday => "Ayer",
        }
    }

    fn at_time(&self, label: &str, time: &str) -> String {
        format!("{label} a las {time}")
    }
}

/// 12-hour clock with AM/PM and zero-padded minutes, the same in every locale.
pub fn format_clock_12h(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    let suffix = if pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {suffix}", time.minute())
}

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

fn english_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn spanish_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}
