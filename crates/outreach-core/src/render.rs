use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;
use uuid::Uuid;

use crate::classify::{Classified, MissionBoard, Status};
use crate::config::Config;
use crate::event::EventKind;
use crate::locale::Locale;

/// Serialized shape of a classified event for `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct MissionView {
    pub id: Uuid,
    pub title: String,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub status: Status,
    pub all_day: bool,
    pub display: String,
    pub starts_at: String,
}

impl From<&Classified<'_>> for MissionView {
    fn from(item: &Classified<'_>) -> Self {
        Self {
            id: item.event.id,
            title: item.event.title.clone(),
            address: item.event.address.clone(),
            kind: item.event.kind,
            status: item.status,
            all_day: item.is_all_day(),
            display: item.display.clone(),
            starts_at: item.instant.to_rfc3339(),
        }
    }
}

struct Labels {
    active: &'static str,
    upcoming: &'static str,
    recent: &'static str,
    no_active: &'static str,
    no_upcoming: &'static str,
    no_recent: &'static str,
    live_badge: &'static str,
    when: &'static str,
    title: &'static str,
    kind: &'static str,
    address: &'static str,
}

fn labels(locale: Locale) -> &'static Labels {
    static EN: Labels = Labels {
        active: "Active",
        upcoming: "Upcoming",
        recent: "Recent",
        no_active: "No active missions.",
        no_upcoming: "No upcoming missions.",
        no_recent: "No recent missions.",
        live_badge: "LIVE",
        when: "When",
        title: "Title",
        kind: "Type",
        address: "Address",
    };
    static ES: Labels = Labels {
        active: "Activas",
        upcoming: "Próximas",
        recent: "Recientes",
        no_active: "No hay misiones activas.",
        no_upcoming: "No hay misiones próximas.",
        no_recent: "No hay misiones recientes.",
        live_badge: "EN VIVO",
        when: "Cuándo",
        title: "Título",
        kind: "Tipo",
        address: "Dirección",
    };

    match locale {
        Locale::En => &EN,
        Locale::Es => &ES,
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    locale: Locale,
}

impl Renderer {
    pub fn new(cfg: &Config, locale: Locale) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);
        Ok(Self { color, locale })
    }

    #[tracing::instrument(skip(self, board), fields(count = board.len()))]
    pub fn print_board(&mut self, board: &MissionBoard<'_>) -> anyhow::Result<()> {
        let color = self.color && io::stdout().is_terminal();
        let out = io::stdout().lock();
        write_board(out, board, self.locale, color)
    }

    #[tracing::instrument(skip(self, item), fields(id = %item.event.id))]
    pub fn print_event_info(&mut self, item: &Classified<'_>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let event = item.event;

        writeln!(out, "id          {}", event.id)?;
        writeln!(out, "title       {}", event.title)?;
        writeln!(out, "type        {}", event.kind)?;
        writeln!(out, "status      {}", item.status.as_str())?;
        writeln!(out, "when        {}", item.display)?;
        writeln!(out, "date        {}", event.date.format("%Y-%m-%d"))?;
        writeln!(
            out,
            "time        {}",
            event.time.as_deref().unwrap_or("all day")
        )?;
        writeln!(out, "starts      {}", item.instant.to_rfc3339())?;
        writeln!(out, "address     {}", event.address)?;
        writeln!(out, "description {}", event.description)?;
        if let Some((lat, lng)) = event.coordinates() {
            writeln!(out, "location    {lat:.4}, {lng:.4}")?;
        }

        Ok(())
    }

    pub fn print_json<T: Serialize + ?Sized>(&mut self, value: &T) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
        Ok(())
    }
}

fn write_board<W: Write>(
    mut writer: W,
    board: &MissionBoard<'_>,
    locale: Locale,
    color: bool,
) -> anyhow::Result<()> {
    let labels = labels(locale);
    let sections = [
        (labels.active, labels.no_active, &board.active),
        (labels.upcoming, labels.no_upcoming, &board.upcoming),
        (labels.recent, labels.no_recent, &board.recent),
    ];

    for (idx, (heading, empty, items)) in sections.into_iter().enumerate() {
        if idx > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", paint(heading, "1", color))?;

        if items.is_empty() {
            writeln!(writer, "  {empty}")?;
            continue;
        }

        let headers = vec![
            String::new(),
            labels.when.to_string(),
            labels.title.to_string(),
            labels.kind.to_string(),
            labels.address.to_string(),
        ];
        let rows = items
            .iter()
            .map(|item| {
                let badge = match item.status {
                    Status::Active => paint(labels.live_badge, "31", color),
                    Status::Upcoming => paint("•", "33", color),
                    Status::Recent => paint("·", "2", color),
                };
                vec![
                    badge,
                    item.display.clone(),
                    item.event.title.clone(),
                    item.event.kind.to_string(),
                    item.event.address.clone(),
                ]
            })
            .collect();

        write_table(&mut writer, headers, rows)?;
    }

    Ok(())
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let last = column_count.saturating_sub(1);
    for (idx, header) in headers.iter().enumerate() {
        let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(header.as_str()));
        write!(writer, "  {header}")?;
        if idx < last {
            write!(writer, "{}", " ".repeat(padding))?;
        }
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "  {cell}")?;
            if idx < last {
                write!(writer, "{}", " ".repeat(padding))?;
            }
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
