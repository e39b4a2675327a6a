pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod derive;
pub mod http;
pub mod model;
pub mod notify;
pub mod prefs;
pub mod remote;
pub mod render;
pub mod session;
pub mod sink;
pub mod store;
pub mod view_state;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::cli::{
  Command,
  ListArgs
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli = cli::GlobalCli::parse_from(
    raw_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tasklane"
  );
  debug!(overrides = cli.rc_overrides.len(), "collected rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let command = cli
    .command
    .unwrap_or(Command::List(
      ListArgs::default()
    ));

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async \
         runtime"
      )?;

  runtime.block_on(
    commands::dispatch(
      &cfg, cli.yes, command
    )
  )?;

  info!("tasklane finished");
  Ok(())
}
