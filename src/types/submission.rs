//! CachedSubmission type for scrobbles waiting to be replayed.
//!
//! A CachedSubmission is written when a scrobble could not be delivered
//! because the machine was offline or the service was unavailable. Entries
//! are identified by a deterministic id computed from their content, so the
//! same play captured twice is only queued once.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::SystemTime;

use super::track::TrackIdentity;

/// A submission waiting in the offline cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSubmission {
    /// SHA256 of (artist, title, album, as_scrobble, captured_at), 16 hex characters.
    pub id: String,
    pub artist: String,
    pub title: String,
    pub album: String,
    /// True for a scrobble, false for a now-playing update.
    pub as_scrobble: bool,
    /// When the play happened. Sent as the scrobble timestamp on replay.
    #[serde(with = "system_time_serde")]
    pub captured_at: SystemTime,
}

impl CachedSubmission {
    /// Creates a new entry; the id is computed from the other fields.
    pub fn new(
        artist: String,
        title: String,
        album: String,
        as_scrobble: bool,
        captured_at: SystemTime,
    ) -> Self {
        let id = compute_submission_id(&artist, &title, &album, as_scrobble, captured_at);
        Self {
            id,
            artist,
            title,
            album,
            as_scrobble,
            captured_at,
        }
    }

    /// Creates a scrobble entry for a validated track.
    pub fn scrobble(identity: &TrackIdentity, captured_at: SystemTime) -> Self {
        Self::new(
            identity.artist.clone(),
            identity.title.clone(),
            identity.album.clone(),
            true,
            captured_at,
        )
    }

    /// Rebuilds the track identity for replay. Duration is not cached.
    pub fn identity(&self) -> TrackIdentity {
        TrackIdentity {
            artist: self.artist.clone(),
            title: self.title.clone(),
            album: self.album.clone(),
            duration_sec: 0,
        }
    }
}

/// Computes a deterministic submission ID.
///
/// The ID is the first 16 hex characters of the SHA256 hash of:
/// `{artist}:{title}:{album}:{as_scrobble}:{unix_seconds}`
pub fn compute_submission_id(
    artist: &str,
    title: &str,
    album: &str,
    as_scrobble: bool,
    captured_at: SystemTime,
) -> String {
    let secs = system_time_serde::unix_seconds(captured_at);
    let input = format!("{}:{}:{}:{}:{}", artist, title, album, as_scrobble, secs);
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..8])
}

/// Serde implementation for SystemTime as Unix seconds.
pub(crate) mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn unix_seconds(time: SystemTime) -> u64 {
        time.duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        unix_seconds(*time).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}
