pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod date;
pub mod mail;
pub mod render;
pub mod shell;
pub mod store;
pub mod task;
pub mod views;

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
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting daybook"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  if let Some(url) = cli.api {
    cfg.set("api.url", url);
    cfg.set("api.backend", "http");
  } else if cli.local {
    cfg.set("api.backend", "local");
  }

  let api = api::open_backend(
    &cfg,
    cli.data.as_deref()
  )
  .context(
    "failed to open task backend"
  )?;

  let tz = cfg.timezone()?;
  let today = date::today_in(tz);
  let selection = match cli.date {
    | Some(raw) => {
      date::DaySelection::new(
        date::parse_day_expr(
          &raw, today
        )
        .with_context(|| {
          format!(
            "invalid --date value: \
             {raw}"
          )
        })?
      )
    }
    | None => {
      date::DaySelection::new(today)
    }
  };

  let renderer =
    render::Renderer::new(&cfg)?;
  let mut session = commands::Session {
    api: api.as_ref(),
    cfg: &cfg,
    renderer: &renderer,
    today,
    selection
  };

  commands::dispatch(
    &mut session,
    cli.command.unwrap_or(
      cli::Command::Shell {
        mode: None
      }
    )
  )?;

  info!("done");
  Ok(())
}
