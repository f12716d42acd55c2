use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::event::Event;

#[derive(Debug)]
pub struct EventStore {
    pub data_dir: PathBuf,
    pub events_path: PathBuf,
}

impl EventStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let events_path = data_dir.join("events.data");
        if !events_path.exists() {
            fs::write(&events_path, "")?;
        }

        info!(
            data_dir = %data_dir.display(),
            events = %events_path.display(),
            "opened event store"
        );

        Ok(Self {
            data_dir,
            events_path,
        })
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> anyhow::Result<Vec<Event>> {
        load_jsonl(&self.events_path).context("failed to load events.data")
    }

    #[tracing::instrument(skip(self, events))]
    pub fn save(&self, events: &[Event]) -> anyhow::Result<()> {
        save_jsonl_atomic(&self.events_path, events).context("failed to save events.data")
    }

    #[tracing::instrument(skip(self, event), fields(id = %event.id, date = %event.date))]
    pub fn add(&self, event: Event) -> anyhow::Result<Vec<Event>> {
        self.add_all(vec![event])
    }

    /// Appends in one write so a batch is stored completely or not at all.
    #[tracing::instrument(skip(self, incoming), fields(count = incoming.len()))]
    pub fn add_all(&self, incoming: Vec<Event>) -> anyhow::Result<Vec<Event>> {
        let mut events = self.load()?;
        for event in incoming {
            if events.iter().any(|existing| existing.id == event.id) {
                return Err(anyhow!("event already stored: {}", event.id));
            }
            events.push(event);
        }
        sort_by_schedule(&mut events);
        self.save(&events)?;
        Ok(events)
    }

    /// Looks up by full id or by an unambiguous id prefix.
    #[tracing::instrument(skip(self))]
    pub fn find(&self, key: &str) -> anyhow::Result<Event> {
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(anyhow!("event id cannot be empty"));
        }

        let events = self.load()?;
        let mut matches = events
            .into_iter()
            .filter(|event| event.id.to_string().starts_with(&key));

        let first = matches
            .next()
            .ok_or_else(|| anyhow!("no event matches id: {key}"))?;
        if matches.next().is_some() {
            return Err(anyhow!("id prefix is ambiguous: {key}"));
        }
        Ok(first)
    }
}

/// Date ascending; on the same day all-day events come before timed ones.
fn sort_by_schedule(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.time.is_some().cmp(&b.time.is_some()))
            .then_with(|| a.time.cmp(&b.time))
    });
}

#[tracing::instrument(skip(path))]
fn load_jsonl(path: &Path) -> anyhow::Result<Vec<Event>> {
    debug!(file = %path.display(), "loading jsonl");
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("failed parsing {} line {}", path.display(), idx + 1))?;
        out.push(event);
    }

    debug!(count = out.len(), "loaded events from jsonl");
    Ok(out)
}

#[tracing::instrument(skip(path, events))]
fn save_jsonl_atomic(path: &Path, events: &[Event]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = events.len(), "saving jsonl atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    for event in events {
        let serialized = serde_json::to_string(event)?;
        writeln!(temp, "{serialized}")?;
    }
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
