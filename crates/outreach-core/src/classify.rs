//! Temporal classification of events against an explicit `now`.
//!
//! Everything here is a pure function of `(event, now, formatter)`. The zone
//! of `now` is the zone in which the event's wall-clock date and time are
//! read; there is no ambient clock or timezone lookup.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::event::Event;
use crate::locale::{DateFormatter, RelativeDay, format_clock_12h};

/// How long a timed event counts as in progress once it has started.
pub const ACTIVE_WINDOW_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Upcoming,
    Recent,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Upcoming => "upcoming",
            Self::Recent => "recent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinState {
    Live,
    Pending,
}

#[derive(Debug, Clone)]
pub struct Classified<'a> {
    pub event: &'a Event,
    pub status: Status,
    pub instant: DateTime<Tz>,
    pub display: String,
}

impl Classified<'_> {
    pub fn is_all_day(&self) -> bool {
        self.event.is_all_day()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPin {
    pub id: Uuid,
    pub title: String,
    pub lat: f64,
    pub lng: f64,
    pub state: PinState,
}

/// Missions panel sections, each already in display order.
#[derive(Debug, Clone, Default)]
pub struct MissionBoard<'a> {
    pub active: Vec<Classified<'a>>,
    pub upcoming: Vec<Classified<'a>>,
    pub recent: Vec<Classified<'a>>,
}

impl<'a> MissionBoard<'a> {
    pub fn from_sorted(classified: Vec<Classified<'a>>) -> Self {
        let mut board = Self::default();
        for item in classified {
            match item.status {
                Status::Active => board.active.push(item),
                Status::Upcoming => board.upcoming.push(item),
                Status::Recent => board.recent.push(item),
            }
        }
        board
    }

    pub fn len(&self) -> usize {
        self.active.len() + self.upcoming.len() + self.recent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolves a wall-clock date and time in `tz`. Repeated local times pick
/// the earliest instant; skipped ones are an error.
pub fn resolve_local(
    date: NaiveDate,
    time: NaiveTime,
    tz: Tz,
) -> Result<DateTime<Tz>, ScheduleError> {
    match tz.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(first, second) => {
            tracing::debug!(
                %date,
                %time,
                first = %first,
                second = %second,
                "ambiguous local datetime; using earliest"
            );
            Ok(if first <= second { first } else { second })
        }
        LocalResult::None => Err(ScheduleError::NonexistentLocalTime {
            date,
            time: time.format("%H:%M").to_string(),
            timezone: tz.name().to_string(),
        }),
    }
}

/// The event's date at its time, or the start of the day for all-day events.
pub fn event_instant(event: &Event, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    match event.clock_time()? {
        Some(time) => resolve_local(event.date, time, tz),
        None => start_of_day(event.date, tz),
    }
}

/// First instant of `date` in `tz`. Midnight is skipped on days where a DST
/// shift happens at 00:00, so this walks forward in quarter hours.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, ScheduleError> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=24 * 4)
        .map(|step| midnight + Duration::minutes(15 * step))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .ok_or_else(|| ScheduleError::NonexistentLocalTime {
            date,
            time: "00:00".to_string(),
            timezone: tz.name().to_string(),
        })
}

pub fn classify_status(event: &Event, now: DateTime<Tz>) -> Result<Status, ScheduleError> {
    match event.clock_time()? {
        Some(time) => {
            let instant = resolve_local(event.date, time, now.timezone())?;
            Ok(timed_status(instant, now))
        }
        None => Ok(all_day_status(event.date, now.date_naive())),
    }
}

fn timed_status(instant: DateTime<Tz>, now: DateTime<Tz>) -> Status {
    if now < instant {
        return Status::Upcoming;
    }
    if now - instant <= Duration::hours(ACTIVE_WINDOW_HOURS) {
        Status::Active
    } else {
        Status::Recent
    }
}

fn all_day_status(event_day: NaiveDate, today: NaiveDate) -> Status {
    match event_day.cmp(&today) {
        Ordering::Equal => Status::Active,
        Ordering::Less => Status::Recent,
        Ordering::Greater => Status::Upcoming,
    }
}

pub fn display_label(
    event: &Event,
    now: DateTime<Tz>,
    formatter: &dyn DateFormatter,
) -> Result<String, ScheduleError> {
    let Some(time) = event.clock_time()? else {
        return Ok(formatter.long_date(event.date));
    };

    let clock = format_clock_12h(time);
    let today = now.date_naive();
    let label = match relative_day(event.date, today) {
        Some(day) => formatter.relative_day(day).to_string(),
        None => formatter.numeric_date(event.date),
    };

    Ok(formatter.at_time(&label, &clock))
}

fn relative_day(date: NaiveDate, today: NaiveDate) -> Option<RelativeDay> {
    if date == today {
        Some(RelativeDay::Today)
    } else if today.succ_opt() == Some(date) {
        Some(RelativeDay::Tomorrow)
    } else if today.pred_opt() == Some(date) {
        Some(RelativeDay::Yesterday)
    } else {
        None
    }
}

#[tracing::instrument(skip_all, fields(id = %event.id))]
pub fn classify<'a>(
    event: &'a Event,
    now: DateTime<Tz>,
    formatter: &dyn DateFormatter,
) -> Result<Classified<'a>, ScheduleError> {
    let instant = event_instant(event, now.timezone())?;
    let status = classify_status(event, now)?;
    let label = display_label(event, now, formatter)?;
    tracing::trace!(status = status.as_str(), %label, "classified event");

    Ok(Classified {
        event,
        status,
        instant,
        display: label,
    })
}

/// Classifies every event and returns them in display order. The first
/// invalid event aborts the whole pass.
#[tracing::instrument(skip_all, fields(count = events.len()))]
pub fn classify_all<'a>(
    events: &'a [Event],
    now: DateTime<Tz>,
    formatter: &dyn DateFormatter,
) -> Result<Vec<Classified<'a>>, ScheduleError> {
    let mut out = events
        .iter()
        .map(|event| classify(event, now, formatter))
        .collect::<Result<Vec<_>, _>>()?;
    sort_for_display(&mut out);
    Ok(out)
}

/// Upcoming first, soonest first; then active and recent, latest first.
pub fn sort_for_display(items: &mut [Classified<'_>]) {
    items.sort_by(|a, b| {
        let a_upcoming = a.status == Status::Upcoming;
        let b_upcoming = b.status == Status::Upcoming;
        match (a_upcoming, b_upcoming) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (true, true) => a.instant.cmp(&b.instant),
            (false, false) => b.instant.cmp(&a.instant),
        }
    });
}

pub fn pin_state(event: &Event, now: DateTime<Tz>) -> Result<PinState, ScheduleError> {
    let instant = event_instant(event, now.timezone())?;
    Ok(if now >= instant {
        PinState::Live
    } else {
        PinState::Pending
    })
}

/// Pins for every event that carries coordinates.
pub fn map_pins(events: &[Event], now: DateTime<Tz>) -> Result<Vec<MapPin>, ScheduleError> {
    let mut pins = Vec::new();
    for event in events {
        let Some((lat, lng)) = event.coordinates() else {
            continue;
        };
        pins.push(MapPin {
            id: event.id,
            title: event.title.clone(),
            lat,
            lng,
            state: pin_state(event, now)?,
        });
    }
    Ok(pins)
}
