pub mod calendar;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod render;
pub mod room;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting homestay CLI"
  );
  cli.validate()?;

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let today = match cli.today {
    | Some(date) => date,
    | None => {
      datetime::today_in_timezone(
        cfg.timezone()
      )
    }
  };
  debug!(%today, timezone = ?cfg.timezone, "resolved today");

  let catalog =
    catalog::RoomCatalog::load(
      &cli.rooms
    )
    .context(
      "failed to load rooms"
    )?;

  let renderer =
    render::Renderer::new(&cfg);

  commands::dispatch(
    &catalog,
    &cfg,
    &renderer,
    today,
    cli.command
  )?;

  info!("done");
  Ok(())
}
