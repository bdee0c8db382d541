use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{info, instrument};

use crate::cli::{AddArgs, CliCommand, ViewArgs};
use crate::config::Settings;
use crate::filter::ViewQuery;
use crate::render::Renderer;
use crate::session::Session;
use crate::source::TaskSource;
use crate::store::TaskStore;

/// The one fetch a run performs. Failures are kept on the store, not raised.
#[instrument(skip_all)]
pub async fn startup_load<S>(source: &S) -> TaskStore
where
    S: TaskSource + Sync + ?Sized,
{
    let mut store = TaskStore::new();
    store.apply(source.fetch().await);
    store
}

#[instrument(skip(store, settings, renderer, input, out))]
pub fn dispatch<R: BufRead, W: Write>(
    command: CliCommand,
    store: TaskStore,
    settings: &Settings,
    renderer: &Renderer,
    input: R,
    out: &mut W,
) -> anyhow::Result<()> {
    match command {
        CliCommand::List(view) => cmd_list(&store, settings, renderer, &view, out),
        CliCommand::Add(add) => cmd_add(store, settings, renderer, add, out),
        CliCommand::Stats => {
            ensure_loaded(&store)?;
            renderer.print_stats(out, store.stats())
        }
        CliCommand::Shell => {
            let mut session = Session::new(store, settings.default_filter);
            session.drive(input, out, renderer)
        }
    }
}

fn cmd_list<W: Write>(
    store: &TaskStore,
    settings: &Settings,
    renderer: &Renderer,
    view: &ViewArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    ensure_loaded(store)?;
    let query = query_for(view, settings);
    renderer.print_dashboard(out, store, &query)
}

fn cmd_add<W: Write>(
    mut store: TaskStore,
    settings: &Settings,
    renderer: &Renderer,
    add: AddArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    ensure_loaded(&store)?;

    let task = store
        .insert(&add.text, add.completed, &add.owner)
        .context("cannot add todo")?
        .clone();
    info!(id = task.id, "command add");

    renderer.print_added(out, &task)?;
    let query = query_for(&add.view, settings);
    renderer.print_dashboard(out, &store, &query)
}

fn ensure_loaded(store: &TaskStore) -> anyhow::Result<()> {
    match store.error() {
        Some(error) => Err(anyhow!("unable to load todos: {error}")),
        None => Ok(()),
    }
}

fn query_for(view: &ViewArgs, settings: &Settings) -> ViewQuery {
    ViewQuery::new(
        view.search.clone(),
        view.filter.unwrap_or(settings.default_filter),
    )
}
