//! Background task bodies.

use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, error, info, warn};

use crate::autodj::AutoDj;
use crate::cache::{DrainReport, OfflineCache};
use crate::catalog::LocalCatalog;
use crate::config::SettingsHandle;
use crate::connectivity::ConnectivityProbe;
use crate::error::{ErrorCategory, ErrorCode};
use crate::playlist::SharedPlaylist;
use crate::service::ScrobbleService;
use crate::types::{CachedSubmission, PlaylistItem, TrackIdentity};

/// Work handed from the router to the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundTask {
    /// Send a now-playing update.
    Announce { track: TrackIdentity },
    /// Record a completed play.
    Scrobble {
        track: TrackIdentity,
        played_at: SystemTime,
    },
    /// Look for recommendations based on the playing track.
    AutoDj { artist: String, title: String },
    /// Replay the offline cache on request.
    DrainCache,
}

impl BackgroundTask {
    pub fn name(&self) -> &'static str {
        match self {
            BackgroundTask::Announce { .. } => "announce",
            BackgroundTask::Scrobble { .. } => "scrobble",
            BackgroundTask::AutoDj { .. } => "autodj",
            BackgroundTask::DrainCache => "drain_cache",
        }
    }
}

/// Callback told about tracks AutoDJ appended to the playlist.
pub type RecommendationHook = Box<dyn Fn(&[PlaylistItem]) + Send + Sync>;

/// Callback told about the outcome of a requested cache drain.
pub type DrainHook = Box<dyn Fn(&DrainReport) + Send + Sync>;

/// Everything a task needs, shared by all workers.
pub struct TaskContext {
    pub service: Arc<dyn ScrobbleService>,
    pub cache: Arc<OfflineCache>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub catalog: Arc<dyn LocalCatalog>,
    pub playlist: SharedPlaylist,
    pub settings: SettingsHandle,
    pub on_recommended: Option<RecommendationHook>,
    pub on_drained: Option<DrainHook>,
}

/// Runs one task to completion. Failures are logged here and go no further.
pub fn run_task(ctx: &TaskContext, task: BackgroundTask) {
    debug!("Running {} task", task.name());
    match task {
        BackgroundTask::Announce { track } => announce(ctx, &track),
        BackgroundTask::Scrobble { track, played_at } => scrobble(ctx, &track, played_at),
        BackgroundTask::AutoDj { artist, title } => auto_dj(ctx, &artist, &title),
        BackgroundTask::DrainCache => drain_cache(ctx),
    }
}

fn announce(ctx: &TaskContext, track: &TrackIdentity) {
    match ctx.service.announce_now_playing(track) {
        Ok(()) => info!("Submitted now playing update for: {}", track),
        Err(e) if e.code == ErrorCode::UnknownError => {
            error!("Exception when updating now playing track {}: {}", track, e);
        }
        Err(e) => {
            error!("Error when announcing now playing track {}: {}", track, e.message);
        }
    }
}

fn scrobble(ctx: &TaskContext, track: &TrackIdentity, played_at: SystemTime) {
    if !ctx.probe.is_online() {
        info!("No internet connection so unable to scrobble: {}", track);
        cache(ctx, track, played_at);
        return;
    }

    if !ctx.cache.is_empty() {
        ctx.cache.drain_and_retry(ctx.service.as_ref());
    }

    match ctx.service.scrobble(track, played_at) {
        Ok(()) => info!("Scrobbled: {}", track),
        Err(e) if e.category() == ErrorCategory::RemoteUnavailable => {
            info!("Unable to scrobble {}: {}", track, e.message);
            cache(ctx, track, played_at);
        }
        Err(e) if e.code == ErrorCode::InvalidParameters => {
            warn!("Scrobble of {} rejected: {}", track, e.message);
        }
        Err(e) => error!("Unable to scrobble {}: {}", track, e),
    }
}

fn cache(ctx: &TaskContext, track: &TrackIdentity, played_at: SystemTime) {
    match ctx
        .cache
        .cache_submission(CachedSubmission::scrobble(track, played_at))
    {
        Ok(()) => info!("Scrobble has been cached"),
        Err(e) => error!("Failed to cache scrobble of {}: {}", track, e),
    }
}

fn drain_cache(ctx: &TaskContext) {
    let report = if ctx.probe.is_online() {
        ctx.cache.drain_and_retry(ctx.service.as_ref())
    } else {
        info!("No internet connection, cache replay postponed");
        DrainReport::skipped()
    };
    if let Some(hook) = &ctx.on_drained {
        hook(&report);
    }
}

fn auto_dj(ctx: &TaskContext, artist: &str, title: &str) {
    let settings = ctx.settings.current();
    let autodj = AutoDj {
        service: ctx.service.as_ref(),
        catalog: ctx.catalog.as_ref(),
        playlist: &ctx.playlist,
        settings: &settings,
    };
    let outcome = autodj.run(artist, title, &mut rand::thread_rng());
    let items = outcome.items();
    if !items.is_empty() {
        if let Some(hook) = &ctx.on_recommended {
            hook(items);
        }
    }
}
