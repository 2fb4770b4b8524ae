//! JSON-RPC server over stdin/stdout.
//!
//! The player writes one request per line on stdin; responses and
//! notifications go to stdout, one JSON document per line.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::OfflineCache;
use crate::cli::Cli;
use crate::config::SettingsHandle;
use crate::dispatch::TaskSink;
use crate::error::Result;
use crate::playlist::SharedPlaylist;
use crate::router::EventBus;

use super::methods::handle_request;
use super::types::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION,
};

/// State shared across all request handlers.
pub struct ServerState {
    /// Player events are published here.
    pub bus: Arc<EventBus>,
    pub playlist: SharedPlaylist,
    pub cache: Arc<OfflineCache>,
    /// Explicit cache drains run here.
    pub tasks: Arc<dyn TaskSink>,
    pub settings: SettingsHandle,
    /// Startup arguments. `reload_settings` re-reads their settings file
    /// and reapplies their path flags.
    pub cli: Cli,
    /// Flag to signal server shutdown.
    shutdown: Arc<AtomicBool>,
}

impl ServerState {
    pub fn new(
        bus: Arc<EventBus>,
        playlist: SharedPlaylist,
        cache: Arc<OfflineCache>,
        tasks: Arc<dyn TaskSink>,
        settings: SettingsHandle,
        cli: Cli,
    ) -> Self {
        Self {
            bus,
            playlist,
            cache,
            tasks,
            settings,
            cli,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Serves requests from stdin until EOF or a `shutdown` call.
pub fn run_server(mut state: ServerState) -> Result<()> {
    info!("JSON-RPC server started, waiting for requests");

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Error reading stdin: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Some(reply) = process_request(&line, &mut state) {
            write_line(&reply);
        }
        if state.is_shutdown() {
            info!("Server shutdown requested");
            break;
        }
    }

    info!("JSON-RPC server stopped");
    Ok(())
}

/// Handles one input line and returns the serialized reply, if one is due.
fn process_request(line: &str, state: &mut ServerState) -> Option<String> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            let error = JsonRpcError::parse_error(format!("Invalid JSON: {}", e));
            return Some(encode(&JsonRpcErrorResponse::new(None, error)));
        }
    };

    let outcome = if request.jsonrpc != JSONRPC_VERSION {
        Err(JsonRpcError::invalid_request(
            "Invalid JSON-RPC version (expected 2.0)",
        ))
    } else {
        debug!("Handling {}", request.method);
        handle_request(&request.method, request.params, state)
    };

    let id = match request.id {
        Some(id) => id,
        None => {
            if let Err(e) = outcome {
                warn!("Notification {} failed: {}", request.method, e.message);
            }
            return None;
        }
    };
    Some(match outcome {
        Ok(result) => encode(&JsonRpcResponse::new(id, result)),
        Err(error) => encode(&JsonRpcErrorResponse::new(Some(id), error)),
    })
}

fn encode<T: serde::Serialize>(message: &T) -> String {
    serde_json::to_string(message).unwrap_or_default()
}

/// Sends a JSON-RPC notification to stdout.
///
/// Safe to call from worker threads: each line is written under the stdout lock.
pub fn send_notification<T: serde::Serialize>(method: &'static str, params: T) {
    write_line(&encode(&JsonRpcNotification::new(method, params)));
}

fn write_line(line: &str) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", line).ok();
    out.flush().ok();
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::testing::RecordingSink;

    pub(crate) fn test_state_with_sink(
        dir: &tempfile::TempDir,
        sink: Arc<RecordingSink>,
    ) -> ServerState {
        ServerState::new(
            Arc::new(EventBus::new()),
            SharedPlaylist::default(),
            Arc::new(OfflineCache::open(dir.path().join("cache.json")).unwrap()),
            sink,
            SettingsHandle::new(Settings::default()),
            Cli::default(),
        )
    }

    pub(crate) fn test_state(dir: &tempfile::TempDir) -> ServerState {
        test_state_with_sink(dir, Arc::new(RecordingSink::default()))
    }

    #[test]
    fn server_state_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        assert!(!state.is_shutdown());
        state.shutdown();
        assert!(state.is_shutdown());
    }

    #[test]
    fn process_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let response = process_request("not json", &mut state).unwrap();
        assert!(response.contains("-32700"));
    }

    #[test]
    fn process_invalid_version() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let request = r#"{"jsonrpc":"1.0","method":"ping","id":1}"#;
        let response = process_request(request, &mut state).unwrap();
        assert!(response.contains("-32600"));
    }

    #[test]
    fn process_unknown_method() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let request = r#"{"jsonrpc":"2.0","method":"unknown","id":1}"#;
        let response = process_request(request, &mut state).unwrap();
        assert!(response.contains("-32601"));
    }

    #[test]
    fn notifications_get_no_reply() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let request = r#"{"jsonrpc":"2.0","method":"playback_started","params":{"file":"/m/a.mp3"}}"#;
        assert!(process_request(request, &mut state).is_none());

        let failing = r#"{"jsonrpc":"2.0","method":"playback_stopped","params":{"file":"/m/a.mp3"}}"#;
        assert!(process_request(failing, &mut state).is_none());
    }

    #[test]
    fn process_ping_echoes_id() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(&dir);
        let request = r#"{"jsonrpc":"2.0","method":"ping","id":"abc"}"#;
        let response: serde_json::Value =
            serde_json::from_str(&process_request(request, &mut state).unwrap()).unwrap();
        assert_eq!(response["id"], "abc");
        assert_eq!(response["result"]["status"], "ok");
    }
}
