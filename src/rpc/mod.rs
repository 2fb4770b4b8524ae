//! JSON-RPC bridge between a media player and the daemon.
//!
//! Methods:
//! - `playback_started`, `playback_changed`, `playback_stopped`, `playback_ended`:
//!   player lifecycle events
//! - `playlist_load`, `playlist_append`, `playlist_set_current`, `playlist_get`:
//!   mirror of the player's active playlist
//! - `cache_status`, `drain_cache`: offline cache inspection and replay;
//!   `drain_cache` only queues the replay
//! - `reload_settings`, `ping`, `shutdown`
//!
//! Requests sent without an `id` are handled as notifications and get no reply.
//!
//! Notifications sent by the daemon:
//! - `playlist_items_added`: tracks appended by AutoDJ
//! - `cache_drained`: report of a replay queued by `drain_cache`

pub mod methods;
pub mod server;
pub mod types;

pub use server::{run_server, send_notification, ServerState};
pub use types::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    PlaylistItemsAddedParams, RequestId,
};
