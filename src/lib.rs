//! scrobbled: scrobbling and AutoDJ daemon for media players.
//!
//! The player reports playback lifecycle events over JSON-RPC. The daemon
//! announces tracks as now playing, scrobbles tracks that were played long
//! enough, keeps scrobbles in an offline cache while the network is down,
//! and optionally keeps the playlist going with similar tracks found in the
//! local catalog.
//!
//! # Modules
//!
//! - [`types`]: Core data types (TrackTags, PlayerEvent, CachedSubmission, PlaylistItem)
//! - [`config`]: Layered settings (Settings, SettingsHandle)
//! - [`error`]: Error types and codes (ScrobblerError, ErrorCode)
//! - [`eligibility`]: Scrobble threshold rules
//! - [`router`]: Player events to background tasks
//! - [`dispatch`]: Bounded worker pool and task handlers
//! - [`cache`]: Persistent offline scrobble cache
//! - [`autodj`]: Three-stage recommendation search
//! - [`service`]: Last.fm client
//! - [`catalog`]: Local music catalog
//! - [`rpc`]: JSON-RPC server for the player bridge
//!
//! # Example
//!
//! ```rust,ignore
//! use scrobbled::eligibility::{evaluate, Eligibility};
//! use scrobbled::types::TrackTags;
//!
//! let tags = TrackTags::new("Song A", "Band X", 240);
//! // Half of the track has been played.
//! assert_eq!(evaluate(&tags, 120), Eligibility::Scrobble);
//! ```

pub mod autodj;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod connectivity;
pub mod dispatch;
pub mod eligibility;
pub mod error;
pub mod playlist;
pub mod router;
pub mod rpc;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types at crate root for convenience
pub use config::{Settings, SettingsHandle};
pub use error::{ErrorCode, Result, ScrobblerError};
pub use types::{CachedSubmission, PlaybackSession, PlayerEvent, PlaylistItem, TrackTags};
