//! scrobbled: scrobbling and AutoDJ daemon for media players.
//!
//! This binary can run in two modes:
//! - Daemon mode: JSON-RPC server the player bridge talks to over stdio
//! - Drain mode: replays the offline cache once and exits

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use scrobbled::cache::{DrainReport, OfflineCache};
use scrobbled::catalog::{LocalCatalog, MemoryCatalog};
use scrobbled::cli::Cli;
use scrobbled::config::{Settings, SettingsHandle};
use scrobbled::connectivity::TcpProbe;
use scrobbled::dispatch::{run_task, BackgroundTask, TaskContext, TaskPool, TaskSink};
use scrobbled::playlist::SharedPlaylist;
use scrobbled::router::{EventBus, PlaybackRouter};
use scrobbled::rpc::{run_server, send_notification, PlaylistItemsAddedParams, ServerState};
use scrobbled::service::{LastFmClient, ScrobbleService};
use scrobbled::types::PlaylistItem;

fn main() {
    let cli = Cli::parse_args();
    init_logging(&cli);

    if let Err(e) = run(&cli) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries the JSON-RPC stream.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    if cli.is_daemon_mode() {
        run_daemon_mode(cli)
    } else if cli.is_drain_mode() {
        run_drain_mode(cli)
    } else {
        print_usage();
        Ok(())
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    cli.apply_overrides(&mut settings);
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn open_service(settings: &Settings) -> Result<Arc<dyn ScrobbleService>> {
    let client =
        LastFmClient::new(settings.lastfm.clone()).context("Failed to create Last.fm client")?;
    if !client.is_authenticated() {
        warn!("No Last.fm session key configured; announcements and scrobbles will be rejected");
    }
    Ok(Arc::new(client))
}

fn open_cache(settings: &Settings) -> Result<Arc<OfflineCache>> {
    let path = settings.effective_cache_path();
    let cache = OfflineCache::open(&path)
        .with_context(|| format!("Failed to open offline cache {}", path.display()))?;
    Ok(Arc::new(cache))
}

/// Runs the daemon mode (JSON-RPC server).
fn run_daemon_mode(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let service = open_service(&settings)?;
    let cache = open_cache(&settings)?;

    let catalog: Arc<dyn LocalCatalog> = match settings.catalog_path {
        Some(ref path) => Arc::new(MemoryCatalog::load(path).context("Failed to load catalog")?),
        None => {
            warn!("No catalog configured; AutoDJ will find no local matches");
            Arc::new(MemoryCatalog::default())
        }
    };

    let workers = settings.workers;
    let capacity = settings.queue_capacity;

    let playlist = SharedPlaylist::default();
    let settings = SettingsHandle::new(settings);

    let ctx = TaskContext {
        service,
        cache: Arc::clone(&cache),
        probe: Arc::new(TcpProbe::default()),
        catalog,
        playlist: playlist.clone(),
        settings: settings.clone(),
        on_recommended: Some(Box::new(|items: &[PlaylistItem]| {
            send_notification(
                "playlist_items_added",
                PlaylistItemsAddedParams {
                    items: items.to_vec(),
                },
            );
        })),
        on_drained: Some(Box::new(|report: &DrainReport| {
            send_notification("cache_drained", report.clone());
        })),
    };
    let pool: Arc<TaskPool<BackgroundTask>> =
        Arc::new(TaskPool::new(workers, capacity, move |task| run_task(&ctx, task)));
    info!(
        "Task pool started with {} workers, queue capacity {}",
        pool.worker_count(),
        pool.capacity()
    );

    let tasks: Arc<dyn TaskSink> = pool;

    let router = PlaybackRouter::new(playlist.clone(), settings.clone(), Arc::clone(&tasks));
    let bus = Arc::new(EventBus::new());
    bus.subscribe(Arc::new(router));

    let state = ServerState::new(bus, playlist, cache, tasks, settings, cli.clone());
    run_server(state).context("JSON-RPC server failed")
}

/// Replays the offline cache once and prints the report.
fn run_drain_mode(cli: &Cli) -> Result<()> {
    let settings = load_settings(cli)?;
    let service = open_service(&settings)?;
    let cache = open_cache(&settings)?;

    info!("Replaying {} cached scrobbles", cache.len());
    let report = cache.drain_and_retry(service.as_ref());
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Prints usage information.
fn print_usage() {
    eprintln!("scrobbled: scrobbling and AutoDJ daemon for media players");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Daemon mode (JSON-RPC server on stdio):");
    eprintln!("    scrobbled --daemon --config settings.json --catalog catalog.json");
    eprintln!();
    eprintln!("  Replay the offline cache:");
    eprintln!("    scrobbled --drain");
    eprintln!();
    eprintln!("Run 'scrobbled --help' for full options.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_usage_doesnt_panic() {
        print_usage();
    }
}
