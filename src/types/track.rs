//! Track metadata types.
//!
//! [`TrackTags`] is the raw tag set a playlist item or catalog record carries.
//! [`TrackIdentity`] is what is left once the tags pass validation: a
//! non-empty title and a resolved artist.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tags known for a track. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    /// Track length in seconds.
    pub duration_sec: u32,
}

/// Why a tag set cannot identify a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagProblem {
    MissingTitle,
    /// Neither artist nor album artist is set.
    MissingArtist,
}

impl fmt::Display for TagProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagProblem::MissingTitle => write!(f, "no title for track"),
            TagProblem::MissingArtist => write!(f, "no artist or album artist found"),
        }
    }
}

impl TrackTags {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, duration_sec: u32) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            duration_sec,
            ..Default::default()
        }
    }

    /// Returns the artist, falling back to the album artist when the artist is blank.
    pub fn resolved_artist(&self) -> Option<&str> {
        [self.artist.trim(), self.album_artist.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
    }

    /// Validates the tags and resolves the submission identity.
    pub fn identity(&self) -> Result<TrackIdentity, TagProblem> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(TagProblem::MissingTitle);
        }
        let artist = self.resolved_artist().ok_or(TagProblem::MissingArtist)?;
        Ok(TrackIdentity {
            artist: artist.to_string(),
            title: title.to_string(),
            album: self.album.trim().to_string(),
            duration_sec: self.duration_sec,
        })
    }
}

/// A validated track, ready to be sent to the scrobbling service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackIdentity {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub duration_sec: u32,
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// A record in the local track catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTrack {
    /// Full path of the audio file; playlist items are matched on it.
    pub file: String,
    /// Artist field as stored by the catalog. May hold several artists.
    pub artist: String,
    #[serde(default)]
    pub album_artist: String,
    #[serde(default)]
    pub album: String,
    pub title: String,
    #[serde(default)]
    pub duration_sec: u32,
}

impl CatalogTrack {
    pub fn tags(&self) -> TrackTags {
        TrackTags {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album_artist: self.album_artist.clone(),
            album: self.album.clone(),
            duration_sec: self.duration_sec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artist_falls_back_to_album_artist() {
        let tags = TrackTags {
            title: "Song A".into(),
            album_artist: "Band X".into(),
            duration_sec: 200,
            ..Default::default()
        };
        assert_eq!(tags.resolved_artist(), Some("Band X"));
        assert_eq!(tags.identity().unwrap().artist, "Band X");
    }

    #[test]
    fn blank_artist_is_treated_as_missing() {
        let tags = TrackTags {
            title: "Song".into(),
            artist: "   ".into(),
            album_artist: "Various".into(),
            ..Default::default()
        };
        assert_eq!(tags.resolved_artist(), Some("Various"));
    }

    #[test]
    fn identity_rejects_missing_tags() {
        let no_title = TrackTags::new("", "Artist", 100);
        assert_eq!(no_title.identity(), Err(TagProblem::MissingTitle));

        let no_artist = TrackTags::new("Title", "", 100);
        assert_eq!(no_artist.identity(), Err(TagProblem::MissingArtist));
    }

    #[test]
    fn identity_trims_fields() {
        let mut tags = TrackTags::new("  Title ", " Artist", 321);
        tags.album = " Album ".into();
        let id = tags.identity().unwrap();
        assert_eq!(id.title, "Title");
        assert_eq!(id.artist, "Artist");
        assert_eq!(id.album, "Album");
        assert_eq!(id.duration_sec, 321);
        assert_eq!(id.to_string(), "Artist - Title");
    }
}
