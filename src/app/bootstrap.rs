use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::watch;

use crate::cli::Cli;
use crate::config::{load_or_builtin, validate_config, Config, ConfigWatcher};
use crate::error::{AppError, Result};
use crate::fetch::{HisStockClient, PayloadSource};
use crate::render::{CsvSnapshotSink, FanoutSink, LogSink, RowSink, TableSink};
use crate::scheduler::{CycleReport, RefreshLoop, Timer};

/// Load the config named on the command line and apply the CLI overrides.
///
/// Returns the file-backed config (before overrides) alongside the effective one so
/// that later reloads can be compared against what is on disk.
pub fn load_startup_config(cli: &Cli) -> Result<(Config, Config, Option<PathBuf>)> {
    let (file_config, found) = load_or_builtin(&cli.config)?;
    let mut effective = file_config.clone();
    cli.apply_overrides(&mut effective);
    validate_config(&effective)?;
    Ok((file_config, effective, found))
}

/// Assemble the sinks for this run. While the table is drawn nothing else writes to the terminal.
pub fn build_sinks(config: &Config, draw_table: bool) -> Result<FanoutSink> {
    let table = if draw_table {
        Some(TableSink::stdout(config.render.table_id.clone())?)
    } else {
        None
    };
    build_sinks_with(config, table)
}

/// Fan out to `table` when given, otherwise to the log, plus the CSV snapshots when configured.
pub fn build_sinks_with(
    config: &Config,
    table: Option<impl RowSink + 'static>,
) -> Result<FanoutSink> {
    let mut sinks = FanoutSink::new();
    match table {
        Some(table) => sinks.push(table),
        None => sinks.push(LogSink::new(config.render.table_id.clone())),
    }
    if let Some(dir) = &config.render.csv_dir {
        sinks.push(CsvSnapshotSink::new(dir)?);
        info!("Writing CSV snapshots to {}", dir.display());
    }
    Ok(sinks)
}

pub async fn run(cli: Cli) -> Result<()> {
    let (file_config, config, found) = load_startup_config(&cli)?;
    let client = HisStockClient::new(&config.fetch)?;
    info!("Fetching from {}", client.request().full_url());

    let sinks = build_sinks(&config, cli.draws_table())?;
    let mut refresh = RefreshLoop::new(client, sinks, config.refresh_interval);

    if cli.once {
        return run_once(&mut refresh).await;
    }

    if let Some(path) = found {
        let watcher = Arc::new(ConfigWatcher::new(path, file_config));
        match watcher.start_watching() {
            Ok(()) => {
                info!("Watching {} for changes", watcher.path().display());
                let updates = relay_with_overrides(watcher.subscribe(), cli.clone(), config);
                refresh = refresh.with_config_updates(updates);
            }
            Err(err) => warn!("Config hot reload disabled: {err}"),
        }
    }

    let shutdown = spawn_shutdown_listener();
    refresh.run(shutdown).await
}

/// Run a single cycle and turn anything short of a rendered table into an error.
pub async fn run_once<S, K, T>(refresh: &mut RefreshLoop<S, K, T>) -> Result<()>
where
    S: PayloadSource,
    K: RowSink,
    T: Timer,
{
    match refresh.run_cycle().await {
        CycleReport::Rendered { rows, .. } => {
            info!("Single cycle rendered {rows} rows");
            Ok(())
        }
        CycleReport::FetchFailed { error, .. } => Err(AppError::message(format!(
            "refresh cycle could not fetch data: {error}"
        ))),
        CycleReport::RenderFailed { rows, error } => Err(AppError::message(format!(
            "refresh cycle could not render {rows} rows: {error}"
        ))),
    }
}

/// Re-apply CLI overrides to every config reloaded from disk before the loop sees it.
fn relay_with_overrides(
    mut file_updates: watch::Receiver<Arc<Config>>,
    cli: Cli,
    initial: Config,
) -> watch::Receiver<Arc<Config>> {
    let (tx, rx) = watch::channel(Arc::new(initial));
    tokio::spawn(async move {
        while file_updates.changed().await.is_ok() {
            let mut config = (**file_updates.borrow_and_update()).clone();
            cli.apply_overrides(&mut config);
            if let Err(err) = validate_config(&config) {
                warn!("Ignoring reloaded config: {err}");
                continue;
            }
            if tx.send(Arc::new(config)).is_err() {
                break;
            }
        }
    });
    rx
}

fn spawn_shutdown_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping");
                let _ = tx.send(true);
            }
            Err(err) => {
                warn!("Ctrl-C handler unavailable: {err}");
                // Keep the sender alive so the loop keeps its schedule.
                std::future::pending::<()>().await;
                drop(tx);
            }
        }
    });
    rx
}
