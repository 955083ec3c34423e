use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::datetime::{CalendarMonth, parse_date_arg};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "homestay",
    version,
    about = "Room availability calendar for the homestay booking site",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Config file; defaults to $HOMESTAY_CONFIG or the platform config dir.
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Override a config key, e.g. `--set calendar.swipe_threshold=40`.
    #[arg(
        long = "set",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub overrides: Vec<KeyVal>,

    /// Rooms payload as returned by the room API, or the backend's fallback file.
    /// `-` reads stdin.
    #[arg(long = "rooms", default_value = "-", global = true)]
    pub rooms: PathBuf,

    /// Pretend today is this date (YYYY-MM-DD) instead of reading the clock.
    #[arg(
        long = "today",
        value_parser = clap::builder::ValueParser::new(|s: &str| parse_date_arg(s)),
        global = true
    )]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List rooms with today's availability.
    Rooms {
        /// Only rooms nobody is staying in today.
        #[arg(long)]
        available: bool,
    },

    /// Show whether a room is occupied today.
    Status { room_id: String },

    /// Print the two visible months of a room's availability calendar.
    Calendar {
        room_id: String,

        /// First visible month (YYYY-MM); defaults to the current month.
        #[arg(
            long,
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<CalendarMonth>())
        )]
        month: Option<CalendarMonth>,

        /// Emit the full four-month window as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Page through a room's calendar with commands read from stdin.
    Browse { room_id: String },
}

impl GlobalCli {
    pub fn validate(&self) -> anyhow::Result<()> {
        if matches!(self.command, Command::Browse { .. }) && self.rooms.as_os_str() == "-" {
            return Err(anyhow!(
                "browse reads navigation from stdin; pass the rooms with --rooms FILE"
            ));
        }
        Ok(())
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_calendar_invocation() {
        let cli = GlobalCli::try_parse_from([
            "homestay",
            "--rooms",
            "rooms.json",
            "--today",
            "2025-06-01",
            "calendar",
            "0101",
            "--month",
            "2025-12",
            "--set",
            "display.color=off",
        ])
        .expect("parse args");

        assert_eq!(cli.rooms, PathBuf::from("rooms.json"));
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2025, 6, 1));
        assert_eq!(cli.overrides.len(), 1);
        assert_eq!(cli.overrides[0].key, "display.color");
        match cli.command {
            Command::Calendar { room_id, month, json } => {
                assert_eq!(room_id, "0101");
                assert_eq!(month, Some(CalendarMonth::new(2025, 11)));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_dates() {
        assert!(GlobalCli::try_parse_from(["homestay", "--today", "June 1", "rooms"]).is_err());
        assert!(
            GlobalCli::try_parse_from(["homestay", "calendar", "0101", "--month", "2025-13"])
                .is_err()
        );
    }

    #[test]
    fn browse_needs_a_rooms_file() {
        let cli = GlobalCli::try_parse_from(["homestay", "browse", "0101"]).expect("parse args");
        assert!(cli.validate().is_err());

        let cli = GlobalCli::try_parse_from(["homestay", "--rooms", "rooms.json", "browse", "0101"])
            .expect("parse args");
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn keyval_requires_equals() {
        assert!("display.color".parse::<KeyVal>().is_err());
        let kv: KeyVal = " timezone = UTC ".parse().expect("parse keyval");
        assert_eq!(kv.key, "timezone");
        assert_eq!(kv.value, "UTC");
    }
}
