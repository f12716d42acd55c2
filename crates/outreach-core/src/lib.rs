pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod error;
pub mod event;
pub mod locale;
pub mod render;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::locale::Locale;

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
    "starting outreach CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.outreachrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let tz = cfg
    .timezone()
    .context("invalid timezone setting")?;
  let locale = match cli.locale.as_deref()
  {
    | Some(raw) => {
      Locale::parse_or_default(raw)
    }
    | None => cfg.locale()
  };
  let now = match cli.now.as_deref() {
    | Some(expr) => {
      datetime::parse_now_expr(
        expr,
        tz,
        Utc::now()
      )?
    }
    | None => Utc::now().with_timezone(&tz)
  };
  debug!(%now, %locale, timezone = tz.name(), "resolved session");

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::EventStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open event store at \
         {}",
        data_dir.display()
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg, locale)?;
  let command = match cli.command {
    | Some(command) => command,
    | None => {
      commands::default_command(&cfg)?
    }
  };

  commands::dispatch(
    &store,
    &cfg,
    &mut renderer,
    command,
    commands::Session {
      now,
      locale
    }
  )?;

  info!("done");
  Ok(())
}
