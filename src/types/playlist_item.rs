//! Playlist item type.

use serde::{Deserialize, Serialize};

use super::track::{CatalogTrack, TrackTags};

/// Source description attached to items inserted by AutoDJ.
pub const AUTODJ_SOURCE_DESCRIPTION: &str = "LastFM:AutoDJ";

/// Who put an item on the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    #[default]
    User,
    Recommendation,
}

/// An entry of the active playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistItem {
    /// File reference; player events name items by it.
    pub file: String,
    /// Tags, when the player has read them.
    #[serde(default)]
    pub tags: Option<TrackTags>,
    #[serde(default)]
    pub source: ItemSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_description: Option<String>,
}

impl PlaylistItem {
    /// Creates a user-added item.
    pub fn new(file: impl Into<String>, tags: Option<TrackTags>) -> Self {
        Self {
            file: file.into(),
            tags,
            source: ItemSource::User,
            source_description: None,
        }
    }

    /// Creates an item for a catalog track chosen by AutoDJ.
    pub fn recommended(track: &CatalogTrack) -> Self {
        Self {
            file: track.file.clone(),
            tags: Some(track.tags()),
            source: ItemSource::Recommendation,
            source_description: Some(AUTODJ_SOURCE_DESCRIPTION.to_string()),
        }
    }
}
