use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::classify::{MissionBoard, classify, classify_all, event_instant, map_pins};
use crate::cli::Command;
use crate::config::Config;
use crate::datastore::EventStore;
use crate::event::{Event, NewEvent};
use crate::locale::Locale;
use crate::render::{MissionView, Renderer};

/// Everything a command needs besides the store: the frozen `now` for this
/// invocation and the output locale.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub now: DateTime<Tz>,
    pub locale: Locale,
}

#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default, rename = "event")]
    events: Vec<NewEvent>,
}

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch(
    store: &EventStore,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
    ctx: Session,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Add(args) => cmd_add(store, NewEvent::from(args), ctx),
        Command::List { json } => cmd_list(store, renderer, json, ctx),
        Command::Show { id, json } => cmd_show(store, renderer, &id, json, ctx),
        Command::Pins => cmd_pins(store, renderer, ctx),
        Command::Import { file, allow_past } => cmd_import(store, &file, allow_past, ctx),
        Command::Export => cmd_export(store, renderer),
        Command::Config => cmd_config(cfg),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Maps the configured `default.command` onto a subcommand.
pub fn default_command(cfg: &Config) -> anyhow::Result<Command> {
    let name = cfg
        .get("default.command")
        .unwrap_or_else(|| "list".to_string());
    match name.trim() {
        "list" => Ok(Command::List { json: false }),
        "pins" => Ok(Command::Pins),
        "export" => Ok(Command::Export),
        other => Err(anyhow!("unsupported default.command: {other}")),
    }
}

#[instrument(skip(store, raw, ctx))]
fn cmd_add(
    store: &EventStore,
    raw: NewEvent,
    ctx: Session,
) -> anyhow::Result<()> {
    let event = raw
        .validate(ctx.now.date_naive())
        .context("event was not added")?;
    let id = event.id;

    let item = classify(&event, ctx.now, ctx.locale.formatter())
        .context("event was not added")?;
    let status = item.status;
    let display = item.display.clone();

    store.add(event)?;
    info!(%id, status = status.as_str(), "added event");
    println!("Added event {id} ({}, {display}).", status.as_str());
    Ok(())
}

#[instrument(skip(store, renderer, ctx))]
fn cmd_list(
    store: &EventStore,
    renderer: &mut Renderer,
    json: bool,
    ctx: Session,
) -> anyhow::Result<()> {
    let events = store.load()?;
    let classified = classify_all(&events, ctx.now, ctx.locale.formatter())
        .context("failed to classify stored events")?;

    if json {
        let views: Vec<MissionView> = classified.iter().map(MissionView::from).collect();
        return renderer.print_json(&views);
    }

    let board = MissionBoard::from_sorted(classified);
    renderer.print_board(&board)
}

#[instrument(skip(store, renderer, ctx))]
fn cmd_show(
    store: &EventStore,
    renderer: &mut Renderer,
    id: &str,
    json: bool,
    ctx: Session,
) -> anyhow::Result<()> {
    let event = store.find(id)?;
    let item = classify(&event, ctx.now, ctx.locale.formatter())
        .with_context(|| format!("failed to classify event {}", event.id))?;

    if json {
        renderer.print_json(&MissionView::from(&item))
    } else {
        renderer.print_event_info(&item)
    }
}

#[instrument(skip(store, renderer, ctx))]
fn cmd_pins(store: &EventStore, renderer: &mut Renderer, ctx: Session) -> anyhow::Result<()> {
    let events = store.load()?;
    let pins = map_pins(&events, ctx.now).context("failed to compute map pins")?;
    debug!(count = pins.len(), "computed map pins");
    renderer.print_json(&pins)
}

#[instrument(skip(store, ctx))]
fn cmd_import(
    store: &EventStore,
    path: &Path,
    allow_past: bool,
    ctx: Session,
) -> anyhow::Result<()> {
    let events = load_import_file(path, allow_past, ctx)?;
    let count = events.len();
    store.add_all(events)?;
    info!(file = %path.display(), count, "imported events");
    println!("Imported {count} event(s).");
    Ok(())
}

/// Parses and validates every entry and resolves its start in the session's
/// zone; nothing is returned unless all pass.
pub fn load_import_file(path: &Path, allow_past: bool, ctx: Session) -> anyhow::Result<Vec<Event>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed: ImportFile = toml::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let today = ctx.now.date_naive();
    let tz = ctx.now.timezone();
    parsed
        .events
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let title = entry.title.clone();
            let result = if allow_past {
                entry.validate_record()
            } else {
                entry.validate(today)
            };
            result
                .map_err(anyhow::Error::from)
                .and_then(|event| {
                    event_instant(&event, tz)?;
                    Ok(event)
                })
                .with_context(|| {
                    format!("{} entry {} ({title:?})", path.display(), idx + 1)
                })
        })
        .collect()
}

#[instrument(skip(store, renderer))]
fn cmd_export(store: &EventStore, renderer: &mut Renderer) -> anyhow::Result<()> {
    let events = store.load()?;
    renderer.print_json(&events)
}

fn cmd_config(cfg: &Config) -> anyhow::Result<()> {
    let mut entries: Vec<(&String, &String)> = cfg.iter().collect();
    entries.sort();
    for (key, value) in entries {
        println!("{key}={value}");
    }
    for file in &cfg.loaded_files {
        println!("# loaded {}", file.display());
    }
    Ok(())
}
