//! Scrobbling service adapter.
//!
//! [`ScrobbleService`] is the contract the rest of the daemon talks to. Every
//! call is a single attempt: retries and caching are decided by the caller,
//! based on the [`ErrorCode`](crate::error::ErrorCode) of the failure.

pub mod lastfm;

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::TrackIdentity;

pub use lastfm::LastFmClient;

/// A track suggested by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTrack {
    pub artist: String,
    pub title: String,
}

impl RemoteTrack {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

/// Remote scrobbling and similarity service.
///
/// Failures carry one of `InvalidParameters`, `ServiceOffline`,
/// `ServiceUnavailable` or `UnknownError`.
pub trait ScrobbleService: Send + Sync {
    /// Tells the service what is playing right now.
    fn announce_now_playing(&self, track: &TrackIdentity) -> Result<()>;

    /// Records a completed play. `played_at` is when the play was recorded,
    /// that is when its session closed; replays keep the original time.
    fn scrobble(&self, track: &TrackIdentity, played_at: SystemTime) -> Result<()>;

    /// Tracks the service considers similar to `artist` - `title`.
    fn similar_tracks(&self, artist: &str, title: &str) -> Result<Vec<RemoteTrack>>;

    /// The most played tracks of `artist`, most popular first.
    fn artist_top_tracks(&self, artist: &str) -> Result<Vec<RemoteTrack>>;
}
