//! JSON-RPC method handlers.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Settings;
use crate::dispatch::BackgroundTask;
use crate::types::PlayerEvent;

use super::server::ServerState;
use super::types::{
    CacheStatusResult, JsonRpcError, PlaybackParams, PlaybackResult, PlaylistAppendParams,
    PlaylistLoadParams, PlaylistResult, PlaylistSetCurrentParams,
};

type MethodResult = Result<serde_json::Value, JsonRpcError>;

/// Handles a JSON-RPC method call.
pub fn handle_request(
    method: &str,
    params: serde_json::Value,
    state: &mut ServerState,
) -> MethodResult {
    match method {
        "playback_started" => publish(state, parse::<PlaybackParams>(params)?.started()),
        "playback_changed" => publish(state, parse::<PlaybackParams>(params)?.changed()?),
        "playback_stopped" => publish(state, parse::<PlaybackParams>(params)?.stopped()?),
        "playback_ended" => publish(state, parse::<PlaybackParams>(params)?.ended()),
        "playlist_load" => handle_playlist_load(params, state),
        "playlist_append" => handle_playlist_append(params, state),
        "playlist_set_current" => handle_playlist_set_current(params, state),
        "playlist_get" => playlist_result(state),
        "cache_status" => handle_cache_status(state),
        "drain_cache" => handle_drain_cache(state),
        "reload_settings" => handle_reload_settings(state),
        "ping" => handle_ping(),
        "shutdown" => handle_shutdown(state),
        _ => Err(JsonRpcError::method_not_found(method)),
    }
}

fn parse<T: DeserializeOwned>(params: serde_json::Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_value<T: Serialize>(value: T) -> MethodResult {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

/// Hands a player event to the bus. Listeners never report failures back.
fn publish(state: &ServerState, event: PlayerEvent) -> MethodResult {
    state.bus.publish(&event);
    to_value(PlaybackResult {
        event: event.name(),
        status: "accepted",
    })
}

fn handle_playlist_load(params: serde_json::Value, state: &ServerState) -> MethodResult {
    let params: PlaylistLoadParams = parse(params)?;
    if let Some(index) = params.current {
        if index >= params.items.len() {
            return Err(JsonRpcError::index_out_of_range(index, params.items.len()));
        }
    }
    info!("Loaded playlist with {} items", params.items.len());
    state.playlist.lock().replace(params.items, params.current);
    playlist_result(state)
}

fn handle_playlist_append(params: serde_json::Value, state: &ServerState) -> MethodResult {
    let params: PlaylistAppendParams = parse(params)?;
    {
        let mut playlist = state.playlist.lock();
        for item in params.items {
            playlist.push(item);
        }
    }
    playlist_result(state)
}

fn handle_playlist_set_current(params: serde_json::Value, state: &ServerState) -> MethodResult {
    let params: PlaylistSetCurrentParams = parse(params)?;
    {
        let mut playlist = state.playlist.lock();
        if let Some(index) = params.index {
            if index >= playlist.len() {
                return Err(JsonRpcError::index_out_of_range(index, playlist.len()));
            }
        }
        playlist.set_current(params.index);
    }
    playlist_result(state)
}

fn playlist_result(state: &ServerState) -> MethodResult {
    let snapshot = state.playlist.snapshot();
    to_value(PlaylistResult {
        current: snapshot.current_index(),
        remaining: snapshot.remaining_after_current(),
        items: snapshot.items().to_vec(),
    })
}

fn handle_cache_status(state: &ServerState) -> MethodResult {
    let entries = state.cache.entries();
    to_value(CacheStatusResult {
        pending: entries.len(),
        path: state.cache.path().display().to_string(),
        entries,
    })
}

/// Queues a cache replay on the worker pool. The outcome is sent later as a
/// `cache_drained` notification.
fn handle_drain_cache(state: &ServerState) -> MethodResult {
    state
        .tasks
        .submit(BackgroundTask::DrainCache)
        .map_err(|e| JsonRpcError::daemon(&e))?;
    Ok(serde_json::json!({
        "status": "accepted",
        "pending": state.cache.len(),
    }))
}

/// Re-reads settings from the environment and the settings file, then
/// reapplies the command-line path flags.
///
/// Worker count, queue capacity, paths and credentials are read at startup
/// only; a changed value is reported but takes effect after a restart.
fn handle_reload_settings(state: &ServerState) -> MethodResult {
    let settings = Settings::load(state.cli.config.as_deref())
        .and_then(|mut s| {
            state.cli.apply_overrides(&mut s);
            s.validate().map(|_| s)
        })
        .map_err(|e| JsonRpcError::daemon(&e))?;

    let current = state.settings.current();
    let restart_required = settings.workers != current.workers
        || settings.queue_capacity != current.queue_capacity
        || settings.cache_path != current.cache_path
        || settings.catalog_path != current.catalog_path
        || settings.lastfm != current.lastfm;
    if restart_required {
        warn!("Some changed settings take effect after a restart");
    }

    let summary = serde_json::json!({
        "status": "reloaded",
        "announce": settings.announce,
        "scrobble": settings.scrobble,
        "auto_dj": settings.auto_dj,
        "randomness": settings.randomness,
        "avoid_duplicates": settings.avoid_duplicates,
        "allow_multiple_versions": settings.allow_multiple_versions,
        "restart_required": restart_required,
    });
    state.settings.replace(settings);
    info!("Settings reloaded");
    Ok(summary)
}

/// Handles the ping method for health checks.
fn handle_ping() -> MethodResult {
    Ok(serde_json::json!({ "status": "ok" }))
}

/// Handles the shutdown method.
fn handle_shutdown(state: &mut ServerState) -> MethodResult {
    state.shutdown();
    Ok(serde_json::json!({ "status": "shutting_down" }))
}
