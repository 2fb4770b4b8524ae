//! JSON-RPC types for the player bridge protocol.

use serde::{Deserialize, Serialize};

use crate::error::ScrobblerError;
use crate::types::{CachedSubmission, MediaKind, PlayerEvent, PlaylistItem};

/// Protocol version carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier, echoed back in the reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

/// One line read from the player.
///
/// A line without an `id` is a notification: it is handled but never
/// answered, which suits fire-and-forget playback events.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Successful reply.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub id: RequestId,
    pub result: T,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(id: RequestId, result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// Error reply. `id` is null when the request could not be parsed.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    pub error: JsonRpcError,
}

impl JsonRpcErrorResponse {
    pub fn new(id: Option<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonRpcErrorData>,
}

/// Extended error data for application-specific errors.
#[derive(Debug, Serialize)]
pub struct JsonRpcErrorData {
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error codes used by the server.
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Playlist index does not exist.
    pub const INDEX_OUT_OF_RANGE: i32 = -32000;
    /// A daemon operation failed; `data.error_code` names the [`ErrorCode`](crate::error::ErrorCode).
    pub const DAEMON_ERROR: i32 = -32001;
}

impl JsonRpcError {
    fn plain(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    fn with_data(code: i32, message: impl Into<String>, error_code: &str, details: String) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(JsonRpcErrorData {
                error_code: error_code.to_string(),
                details: Some(details),
            }),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::plain(codes::PARSE_ERROR, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::plain(codes::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::plain(codes::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::plain(codes::INVALID_PARAMS, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::plain(codes::INTERNAL_ERROR, message)
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::with_data(
            codes::INDEX_OUT_OF_RANGE,
            "Playlist index out of range",
            "INDEX_OUT_OF_RANGE",
            format!("Index {} but playlist has {} items", index, len),
        )
    }

    /// Wraps a daemon error, keeping its code for the client.
    pub fn daemon(error: &ScrobblerError) -> Self {
        Self::with_data(
            codes::DAEMON_ERROR,
            error.code.description(),
            error.code.as_str(),
            error.message.clone(),
        )
    }
}

// ============================================================================
// Playback events
// ============================================================================

fn default_kind() -> String {
    MediaKind::Music.as_str().to_string()
}

/// Parameters shared by the four `playback_*` methods.
#[derive(Debug, Deserialize)]
pub struct PlaybackParams {
    /// Media kind as reported by the player. Defaults to music.
    #[serde(default = "default_kind")]
    pub kind: String,

    /// File reference of the item the event is about.
    pub file: String,

    /// Seconds played; required for `changed` and `stopped`.
    #[serde(default)]
    pub stop_time: Option<u32>,
}

impl PlaybackParams {
    pub fn started(self) -> PlayerEvent {
        PlayerEvent::Started {
            kind: MediaKind::parse(&self.kind),
            file: self.file,
        }
    }

    pub fn changed(self) -> Result<PlayerEvent, JsonRpcError> {
        let stop_time = self.require_stop_time()?;
        Ok(PlayerEvent::Changed {
            kind: MediaKind::parse(&self.kind),
            stop_time,
            file: self.file,
        })
    }

    pub fn stopped(self) -> Result<PlayerEvent, JsonRpcError> {
        let stop_time = self.require_stop_time()?;
        Ok(PlayerEvent::Stopped {
            kind: MediaKind::parse(&self.kind),
            stop_time,
            file: self.file,
        })
    }

    /// Any `stop_time` sent with `ended` is ignored; the track played to the end.
    pub fn ended(self) -> PlayerEvent {
        PlayerEvent::Ended {
            kind: MediaKind::parse(&self.kind),
            file: self.file,
        }
    }

    fn require_stop_time(&self) -> Result<u32, JsonRpcError> {
        self.stop_time
            .ok_or_else(|| JsonRpcError::invalid_params("stop_time is required"))
    }
}

/// Result of a `playback_*` call.
#[derive(Debug, Serialize)]
pub struct PlaybackResult {
    pub event: &'static str,
    pub status: &'static str,
}

// ============================================================================
// Playlist
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaylistLoadParams {
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub current: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistAppendParams {
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistSetCurrentParams {
    /// `null` clears the current item.
    pub index: Option<usize>,
}

/// Snapshot of the playlist returned by the playlist methods.
#[derive(Debug, Serialize)]
pub struct PlaylistResult {
    pub items: Vec<PlaylistItem>,
    pub current: Option<usize>,
    /// Items after the current one.
    pub remaining: usize,
}

// ============================================================================
// Cache
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CacheStatusResult {
    pub pending: usize,
    pub path: String,
    pub entries: Vec<CachedSubmission>,
}

// ============================================================================
// Notifications
// ============================================================================

/// A JSON-RPC notification (no id field).
#[derive(Debug, Serialize)]
pub struct JsonRpcNotification<T: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: T,
}

impl<T: Serialize> JsonRpcNotification<T> {
    pub fn new(method: &'static str, params: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Notification sent when AutoDJ appends tracks to the playlist.
#[derive(Debug, Serialize)]
pub struct PlaylistItemsAddedParams {
    pub items: Vec<PlaylistItem>,
}
