use std::io::{self, IsTerminal, Write};

use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::calendar::{DayCell, DayStatus, MonthView};
use crate::config::Config;
use crate::room::{Room, RoomStatus};

const WEEKDAY_LABELS: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const CELL_WIDTH: usize = 3;
const MONTH_WIDTH: usize = CELL_WIDTH * 7 + 6;
const MONTH_GAP: &str = "    ";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> Self {
        Self {
            color: cfg.display.color && io::stdout().is_terminal(),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, rooms))]
    pub fn write_room_table<W: Write>(
        &self,
        out: &mut W,
        rooms: &[&Room],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let headers = vec![
            "ID".to_string(),
            "Name".to_string(),
            "Price".to_string(),
            "Guests".to_string(),
            "Today".to_string(),
        ];

        let rows = rooms
            .iter()
            .map(|room| {
                let status = room.status_on(today);
                let label = if status.available {
                    self.paint(status.as_key(), "32")
                } else {
                    self.paint(status.as_key(), "31")
                };
                vec![
                    self.paint(&room.id, "33"),
                    room.name.clone(),
                    format_price(room.price),
                    room.capacity.to_string(),
                    label,
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    #[tracing::instrument(skip(self, out, room, status))]
    pub fn write_room_status<W: Write>(
        &self,
        out: &mut W,
        room: &Room,
        status: &RoomStatus,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        writeln!(out, "room      {} ({})", room.name, room.id)?;
        writeln!(out, "date      {}", today.format("%Y-%m-%d"))?;
        let code = if status.available { "32" } else { "31" };
        writeln!(out, "status    {}", self.paint(status.as_key(), code))?;

        if let Some(booking) = &status.current_booking {
            writeln!(
                out,
                "stay      {} -> {} ({} nights)",
                booking.check_in.format("%Y-%m-%d"),
                booking.check_out.format("%Y-%m-%d"),
                booking.nights()
            )?;
            if let Some(guest) = &booking.guest_name {
                writeln!(out, "guest     {guest}")?;
            }
        }

        Ok(())
    }

    /// Paints months next to each other, one block per month.
    #[tracing::instrument(skip(self, out, months))]
    pub fn write_months<W: Write>(&self, out: &mut W, months: &[&MonthView]) -> anyhow::Result<()> {
        let blocks: Vec<Vec<String>> = months.iter().map(|month| self.month_lines(month)).collect();
        let height = blocks.iter().map(Vec::len).max().unwrap_or(0);

        for line_idx in 0..height {
            let line = blocks
                .iter()
                .map(|block| {
                    let text = block.get(line_idx).map(String::as_str).unwrap_or("");
                    pad_visible(text, MONTH_WIDTH)
                })
                .collect::<Vec<_>>()
                .join(MONTH_GAP);
            writeln!(out, "{}", line.trim_end())?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "{} today  {} booked  {} available",
            self.paint("*", "1"),
            self.paint("x", "31"),
            self.paint("·", "32")
        )?;
        Ok(())
    }

    fn month_lines(&self, month: &MonthView) -> Vec<String> {
        let mut lines = Vec::with_capacity(8);
        lines.push(format!("{:^width$}", month.label, width = MONTH_WIDTH));
        lines.push(
            WEEKDAY_LABELS
                .iter()
                .map(|label| format!("{label:<CELL_WIDTH$}"))
                .collect::<Vec<_>>()
                .join(" "),
        );
        for week in month.weeks() {
            lines.push(
                week.iter()
                    .map(|cell| self.cell_text(cell))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        lines
    }

    fn cell_text(&self, cell: &DayCell) -> String {
        let Some(date) = cell.date else {
            return " ".repeat(CELL_WIDTH);
        };
        let (marker, code) = match cell.status {
            DayStatus::Empty => (' ', "0"),
            DayStatus::Past => (' ', "2"),
            DayStatus::Today => ('*', "1;7"),
            DayStatus::Booked => ('x', "31"),
            DayStatus::Available => ('·', "32"),
        };
        self.paint(&format!("{:>2}{marker}", date.day()), code)
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{price:.0}")
    } else {
        format!("{price:.2}")
    }
}

fn pad_visible(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(strip_ansi(text).as_str());
    format!("{text}{}", " ".repeat(width.saturating_sub(visible)))
}

fn write_table<W: Write>(
    writer: &mut W,
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

    let header_line = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| pad_visible(header, widths[idx]))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{rule}")?;

    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(idx, cell)| pad_visible(cell, widths[idx]))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line.trim_end())?;
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
