use std::fs;

use chrono::{DateTime, TimeZone};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use outreach_core::classify::{MissionBoard, PinState, Status, classify_all, map_pins};
use outreach_core::commands::{Session, load_import_file};
use outreach_core::datastore::EventStore;
use outreach_core::event::NewEvent;
use outreach_core::locale::Locale;
use tempfile::tempdir;

fn now() -> DateTime<Tz> {
    New_York
        .with_ymd_and_hms(2024, 7, 20, 12, 0, 0)
        .single()
        .expect("valid now")
}

fn form(title: &str, date: &str, time: Option<&str>) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        date: date.to_string(),
        time: time.map(str::to_string),
        address: "4110 Chain Bridge Rd, Fairfax, VA 22030".to_string(),
        description: "Handing out tracts and talking with neighbours.".to_string(),
        kind: "Outreach".to_string(),
        lat: None,
        lng: None,
    }
}

#[test]
fn store_roundtrip_and_board() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open store");
    let today = now().date_naive();

    let later = form("Campus Meetup", "2024-07-21", Some("14:00"))
        .validate(today)
        .expect("valid");
    let live = form("Courthouse Outreach", "2024-07-20", Some("11:00"))
        .validate(today)
        .expect("valid");
    let all_day = form("Prayer Walk", "2024-07-20", None)
        .validate(today)
        .expect("valid");

    store.add(later.clone()).expect("add later");
    store.add(live.clone()).expect("add live");
    store.add(all_day.clone()).expect("add all-day");

    let reopened = EventStore::open(temp.path()).expect("reopen store");
    let events = reopened.load().expect("load");
    let stored_order: Vec<_> = events.iter().map(|e| e.id).collect();
    assert_eq!(stored_order, vec![all_day.id, live.id, later.id]);

    let classified = classify_all(&events, now(), Locale::En.formatter()).expect("classify");
    let board = MissionBoard::from_sorted(classified);
    assert_eq!(board.upcoming.len(), 1);
    assert_eq!(board.upcoming[0].display, "Tomorrow at 2:00 PM");
    assert_eq!(board.active.len(), 2);
    assert_eq!(board.active[0].event.id, live.id);
    assert_eq!(board.active[0].display, "Today at 11:00 AM");
    assert_eq!(board.active[1].display, "Saturday, July 20, 2024");
    assert!(board.recent.is_empty());

    let found = reopened
        .find(&live.id.to_string()[..8])
        .expect("find by prefix");
    assert_eq!(found.id, live.id);
    assert!(reopened.find("zzzz").is_err());
}

#[test]
fn duplicate_ids_are_rejected() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open store");
    let event = form("Campus Meetup", "2024-07-21", Some("14:00"))
        .validate(now().date_naive())
        .expect("valid");

    store.add(event.clone()).expect("first add");
    assert!(store.add(event).is_err());
    assert_eq!(store.load().expect("load").len(), 1);
}

#[test]
fn corrupt_time_in_store_surfaces_as_error() {
    let temp = tempdir().expect("tempdir");
    let store = EventStore::open(temp.path()).expect("open store");
    let mut event = form("Campus Meetup", "2024-07-21", Some("14:00"))
        .validate(now().date_naive())
        .expect("valid");
    event.time = Some("25:99".to_string());
    store.add(event).expect("store does not classify");

    let events = store.load().expect("load");
    let err = classify_all(&events, now(), Locale::En.formatter()).expect_err("bad time");
    assert_eq!(
        err.to_string(),
        "invalid time format '25:99': expected HH:MM between 00:00 and 23:59"
    );
}

#[test]
fn import_validates_every_entry_then_stores() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("seed.toml");
    fs::write(
        &path,
        r#"
[[event]]
title = "Fairfax County Courthouse Outreach"
date = "2024-07-20"
time = "11:00"
address = "4110 Chain Bridge Rd, Fairfax, VA 22030"
description = "Handing out tracts near the courthouse."
type = "Outreach"
lat = 38.8463
lng = -77.3065

[[event]]
title = "Community Cookout at Burke Lake Park"
date = "2024-07-23"
time = "13:00"
address = "7315 Ox Rd, Fairfax Station, VA 22039"
description = "A friendly community event with free food."
type = "Community"
"#,
    )
    .expect("write seed");

    let session = Session {
        now: now(),
        locale: Locale::En,
    };
    let events = load_import_file(&path, false, session).expect("import");
    assert_eq!(events.len(), 2);

    let store = EventStore::open(&temp.path().join("data")).expect("open store");
    store.add_all(events).expect("store");
    let events = store.load().expect("load");

    let pins = map_pins(&events, now()).expect("pins");
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0].state, PinState::Live);

    let classified = classify_all(&events, now(), Locale::Es.formatter()).expect("classify");
    assert_eq!(classified[0].status, Status::Upcoming);
    assert_eq!(classified[0].display, "23/7/2024 a las 1:00 PM");
    assert_eq!(classified[1].status, Status::Active);
    assert_eq!(classified[1].display, "Hoy a las 11:00 AM");
}

#[test]
fn import_rejects_whole_file_on_one_bad_entry() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("seed.toml");
    fs::write(
        &path,
        r#"
[[event]]
title = "Worship Night"
date = "2024-07-21"
address = "4400 University Dr"
description = "Evening of worship and prayer."
type = "Worship"

[[event]]
title = "Training Session"
date = "2024-07-22"
time = "7pm"
address = "4400 University Dr"
description = "Street evangelism training."
type = "Training"
"#,
    )
    .expect("write seed");

    let session = Session {
        now: now(),
        locale: Locale::En,
    };
    let err = load_import_file(&path, false, session).expect_err("bad entry");
    let message = format!("{err:#}");
    assert!(message.contains("entry 2"));
    assert!(message.contains("invalid time format '7pm'"));
}

#[test]
fn import_past_dates_need_opt_in() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("history.toml");
    fs::write(
        &path,
        r#"
[[event]]
title = "Last Year's Outreach"
date = "2023-07-20"
address = "4110 Chain Bridge Rd"
description = "An outreach from the archive."
type = "Outreach"
"#,
    )
    .expect("write history");

    let session = Session {
        now: now(),
        locale: Locale::En,
    };
    assert!(load_import_file(&path, false, session).is_err());
    let events = load_import_file(&path, true, session).expect("allow past");
    assert_eq!(events.len(), 1);
}

#[test]
fn import_rejects_time_skipped_by_dst() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("spring.toml");
    fs::write(
        &path,
        r#"
[[event]]
title = "Sunrise Prayer Walk"
date = "2025-03-08"
address = "10300 Main St, Fairfax, VA 22030"
description = "Walking and praying through Old Town."
type = "Worship"

[[event]]
title = "Early Outreach"
date = "2025-03-09"
time = "02:30"
address = "4110 Chain Bridge Rd, Fairfax, VA 22030"
description = "Scheduled inside the spring-forward hour."
type = "Outreach"
"#,
    )
    .expect("write seed");

    let session = Session {
        now: New_York
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid now"),
        locale: Locale::En,
    };
    let err = load_import_file(&path, false, session).expect_err("skipped local time");
    let message = format!("{err:#}");
    assert!(message.contains("entry 2"));
    assert!(message.contains("local time 2025-03-09 02:30 does not exist"));
}
