use std::io::{self, BufRead, Write};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::calendar::{
    CalendarController, MonthView, NavigationCommand, NavigationOutcome, interpret_swipe,
};
use crate::catalog::RoomCatalog;
use crate::cli::Command;
use crate::config::Config;
use crate::datetime::CalendarMonth;
use crate::render::Renderer;
use crate::room::{Room, available_rooms};

/// One line of input in an interactive browse session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrowseInput {
    Navigate(NavigationCommand),
    /// A swipe too short to count as a gesture.
    Tap,
    Quit,
    Blank,
}

#[derive(Debug, Serialize)]
struct CalendarJson<'a> {
    room_id: &'a str,
    room_name: &'a str,
    today: NaiveDate,
    anchor: CalendarMonth,
    window: &'a [MonthView; 4],
}

#[instrument(skip(catalog, cfg, renderer, command))]
pub fn dispatch(
    catalog: &RoomCatalog,
    cfg: &Config,
    renderer: &Renderer,
    today: NaiveDate,
    command: Command,
) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Rooms { available } => cmd_rooms(&mut out, catalog, renderer, today, available),
        Command::Status { room_id } => {
            let room = catalog.require(&room_id)?;
            let status = room.status_on(today);
            info!(room = %room.id, status = status.as_key(), "room status");
            renderer.write_room_status(&mut out, room, &status, today)
        }
        Command::Calendar {
            room_id,
            month,
            json,
        } => {
            let room = catalog.require(&room_id)?;
            cmd_calendar(&mut out, cfg, renderer, room, today, month, json)
        }
        Command::Browse { room_id } => {
            let room = catalog.require(&room_id)?;
            let mut controller = CalendarController::new(cfg.carousel_settings(), today);
            controller.open_for_room(room.clone(), today);
            let stdin = io::stdin();
            run_browse(
                &mut controller,
                renderer,
                cfg.swipe_threshold(),
                stdin.lock(),
                &mut out,
            )
        }
    }
}

fn cmd_rooms<W: Write>(
    out: &mut W,
    catalog: &RoomCatalog,
    renderer: &Renderer,
    today: NaiveDate,
    available_only: bool,
) -> anyhow::Result<()> {
    let rooms: Vec<&Room> = if available_only {
        available_rooms(catalog.rooms(), today)
    } else {
        catalog.rooms().iter().collect()
    };
    info!(
        total = catalog.rooms().len(),
        shown = rooms.len(),
        available_only,
        "listing rooms"
    );

    if rooms.is_empty() {
        writeln!(out, "No rooms.")?;
        return Ok(());
    }
    renderer.write_room_table(out, &rooms, today)
}

fn cmd_calendar<W: Write>(
    out: &mut W,
    cfg: &Config,
    renderer: &Renderer,
    room: &Room,
    today: NaiveDate,
    month: Option<CalendarMonth>,
    json: bool,
) -> anyhow::Result<()> {
    let anchor = month.unwrap_or_else(|| CalendarMonth::containing(today));
    let mut controller = CalendarController::new(cfg.carousel_settings(), today);
    controller.open_at(room.clone(), today, anchor);

    let window = controller
        .render_window()
        .ok_or_else(|| anyhow!("calendar window was not built"))?;

    if json {
        let payload = CalendarJson {
            room_id: &room.id,
            room_name: &room.name,
            today,
            anchor,
            window,
        };
        serde_json::to_writer_pretty(&mut *out, &payload)
            .context("failed to serialize calendar")?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "{} ({})", room.name, room.id)?;
    writeln!(out)?;
    renderer.write_months(out, &[&window[1], &window[2]])
}

pub fn parse_browse_line(line: &str, swipe_threshold: f64) -> anyhow::Result<BrowseInput> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(BrowseInput::Blank);
    };

    match verb.to_ascii_lowercase().as_str() {
        "n" | "next" => Ok(BrowseInput::Navigate(NavigationCommand::Next)),
        "p" | "prev" | "previous" => Ok(BrowseInput::Navigate(NavigationCommand::Previous)),
        "q" | "quit" | "exit" => Ok(BrowseInput::Quit),
        "swipe" => {
            let mut coord = |name: &str| -> anyhow::Result<f64> {
                let raw = words
                    .next()
                    .ok_or_else(|| anyhow!("swipe needs START and END, missing {name}"))?;
                raw.parse::<f64>()
                    .with_context(|| format!("invalid swipe {name}: {raw}"))
            };
            let start_x = coord("START")?;
            let end_x = coord("END")?;
            Ok(interpret_swipe(start_x, end_x, swipe_threshold)
                .map(BrowseInput::Navigate)
                .unwrap_or(BrowseInput::Tap))
        }
        other => Err(anyhow!(
            "unknown input: {other} (expected next, prev, swipe START END or quit)"
        )),
    }
}

/// Drives an opened controller from line-based input until `quit` or end of input.
///
/// Each accepted slide is completed before the next line is read, so there is
/// no running animation for later input to collide with.
pub fn run_browse<R: BufRead, W: Write>(
    controller: &mut CalendarController,
    renderer: &Renderer,
    swipe_threshold: f64,
    input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    paint_visible(controller, renderer, out)?;

    for line in input.lines() {
        let line = line.context("failed reading browse input")?;
        let command = match parse_browse_line(&line, swipe_threshold) {
            Ok(BrowseInput::Navigate(command)) => command,
            Ok(BrowseInput::Quit) => break,
            Ok(BrowseInput::Tap | BrowseInput::Blank) => continue,
            Err(err) => {
                warn!(input = %line, error = %err, "ignoring browse input");
                writeln!(out, "{err}")?;
                continue;
            }
        };

        match controller.dispatch(command) {
            NavigationOutcome::Accepted { anchor } => {
                debug!(%anchor, "sliding calendar");
                controller.on_animation_complete();
                paint_visible(controller, renderer, out)?;
            }
            NavigationOutcome::IgnoredWhileAnimating => {
                debug!(?command, "dropped input during transition");
            }
            NavigationOutcome::NotReady => {
                return Err(anyhow!("no room is open"));
            }
        }
    }

    Ok(())
}

fn paint_visible<W: Write>(
    controller: &CalendarController,
    renderer: &Renderer,
    out: &mut W,
) -> anyhow::Result<()> {
    let [first, second] = controller
        .visible_months()
        .ok_or_else(|| anyhow!("no room is open"))?;
    renderer.write_months(out, &[first, second])?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::calendar::CarouselSettings;
    use crate::room::BookedInterval;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn garden() -> Room {
        let mut room = Room::new("0101", "Garden");
        room.booked_intervals = vec![BookedInterval::new(date(2025, 6, 10), date(2025, 6, 13))];
        room
    }

    fn browse(script: &str) -> (CalendarController, String) {
        let today = date(2025, 6, 1);
        let mut controller = CalendarController::new(CarouselSettings::default(), today);
        controller.open_for_room(garden(), today);
        let mut out = Vec::new();
        run_browse(
            &mut controller,
            &Renderer::plain(),
            50.0,
            Cursor::new(script.to_string()),
            &mut out,
        )
        .expect("browse session");
        (controller, String::from_utf8(out).expect("utf8 output"))
    }

    #[test]
    fn browse_lines_parse() {
        assert_eq!(
            parse_browse_line("  next ", 50.0).expect("parse"),
            BrowseInput::Navigate(NavigationCommand::Next)
        );
        assert_eq!(
            parse_browse_line("P", 50.0).expect("parse"),
            BrowseInput::Navigate(NavigationCommand::Previous)
        );
        assert_eq!(
            parse_browse_line("swipe 300 200", 50.0).expect("parse"),
            BrowseInput::Navigate(NavigationCommand::Next)
        );
        assert_eq!(
            parse_browse_line("swipe 100 160", 50.0).expect("parse"),
            BrowseInput::Navigate(NavigationCommand::Previous)
        );
        assert_eq!(
            parse_browse_line("swipe 100 150", 50.0).expect("parse"),
            BrowseInput::Tap
        );
        assert_eq!(parse_browse_line("", 50.0).expect("parse"), BrowseInput::Blank);
        assert_eq!(parse_browse_line("quit", 50.0).expect("parse"), BrowseInput::Quit);
        assert!(parse_browse_line("swipe 100", 50.0).is_err());
        assert!(parse_browse_line("swipe a b", 50.0).is_err());
        assert!(parse_browse_line("jump", 50.0).is_err());
    }

    #[test]
    fn browse_session_moves_anchor() {
        let (controller, text) = browse("next\nnext\nswipe 100 200\nq\nnext\n");
        assert_eq!(controller.anchor(), CalendarMonth::new(2025, 6));
        assert!(!controller.is_animating());
        // Initial paint plus three slides; input after quit is never read.
        assert_eq!(text.matches("today  x booked").count(), 4);
        assert!(text.contains("August 2025"));
        assert!(text.contains("September 2025"));
    }

    #[test]
    fn browse_reports_bad_lines_and_continues() {
        let (controller, text) = browse("hop\nprev\n");
        assert!(text.contains("unknown input: hop"));
        assert_eq!(controller.anchor(), CalendarMonth::new(2025, 4));
        assert!(text.contains("May 2025"));
    }

    #[test]
    fn rooms_listing_filters_available() {
        let mut loft = Room::new("0102", "Loft");
        loft.booked_intervals = vec![BookedInterval::new(date(2025, 6, 1), date(2025, 6, 5))];
        let catalog = RoomCatalog::new(vec![garden(), loft]);

        let mut out = Vec::new();
        cmd_rooms(&mut out, &catalog, &Renderer::plain(), date(2025, 6, 2), true)
            .expect("list rooms");
        let text = String::from_utf8(out).expect("utf8 output");
        assert!(text.contains("Garden"));
        assert!(!text.contains("Loft"));
    }

    #[test]
    fn calendar_json_carries_four_months() {
        let mut out = Vec::new();
        cmd_calendar(
            &mut out,
            &Config::default(),
            &Renderer::plain(),
            &garden(),
            date(2025, 6, 1),
            Some(CalendarMonth::new(2025, 5)),
            true,
        )
        .expect("calendar json");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("valid json");
        let window = value["window"].as_array().expect("window array");
        assert_eq!(window.len(), 4);
        assert_eq!(window[0]["label"], "May 2025");
        assert_eq!(window[1]["label"], "June 2025");
        let june_cells = window[1]["cells"].as_array().expect("cells");
        let tenth = june_cells
            .iter()
            .find(|cell| cell["date"] == "2025-06-10")
            .expect("june 10 present");
        assert_eq!(tenth["status"], "booked");
        assert_eq!(value["room_id"], "0101");
    }

    #[test]
    fn calendar_text_shows_two_months() {
        let mut out = Vec::new();
        cmd_calendar(
            &mut out,
            &Config::default(),
            &Renderer::plain(),
            &garden(),
            date(2025, 6, 1),
            None,
            false,
        )
        .expect("calendar text");
        let text = String::from_utf8(out).expect("utf8 output");
        assert!(text.starts_with("Garden (0101)"));
        assert!(text.contains("June 2025"));
        assert!(text.contains("July 2025"));
        assert!(!text.contains("May 2025"));
    }
}
