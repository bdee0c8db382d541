pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod filter;
pub mod render;
pub mod session;
pub mod source;
pub mod store;
pub mod task;

use std::ffi::OsString;
use std::io::{
  self,
  IsTerminal
};

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub async fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args);
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
    "starting todoflow"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre
      .rc_overrides
      .into_iter()
      .chain(
        cli
          .rc_overrides
          .into_iter()
          .map(|kv| (kv.key, kv.value))
      )
      .chain(cli.url.map(|url| {
        ("api.url".to_string(), url)
      }))
  );

  let settings = cfg
    .settings()
    .context("invalid configuration")?;

  let source =
    source::HttpTaskSource::new(
      settings.api_url.as_str(),
      settings.api_timeout,
      settings.api_limit
    )?;

  let renderer =
    render::Renderer::new(
      settings.color
        && io::stdout().is_terminal()
    );

  let command =
    cli.command.unwrap_or_else(|| {
      cli::CliCommand::List(
        cli::ViewArgs::default()
      )
    });

  let store =
    commands::startup_load(&source)
      .await;

  let stdin = io::stdin().lock();
  let mut stdout = io::stdout().lock();
  commands::dispatch(
    command,
    store,
    &settings,
    &renderer,
    stdin,
    &mut stdout
  )?;

  info!("done");
  Ok(())
}
