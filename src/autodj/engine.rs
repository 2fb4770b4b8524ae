//! Cascading recommendation search.
//!
//! Starting from the track that just began playing, the engine asks the
//! remote service for candidates in three widening stages and stops at the
//! first stage that yields a local match:
//!
//! 1. tracks similar to the playing track
//! 2. tracks similar to each of the artist's top tracks (first
//!    [`TOP_TRACK_LIMIT`] only)
//! 3. the artist's top tracks themselves
//!
//! Remote failures never abort the cascade; a failed stage counts as empty.

use std::fmt;

use rand::Rng;
use tracing::{debug, error, info};

use crate::catalog::LocalCatalog;
use crate::config::Settings;
use crate::error::{ErrorCode, Result};
use crate::playlist::SharedPlaylist;
use crate::service::{RemoteTrack, ScrobbleService};
use crate::types::PlaylistItem;

use super::matcher::cross_reference;
use super::selector::add_recommendations;

/// Maximum number of top tracks whose similar tracks are looked up.
pub const TOP_TRACK_LIMIT: usize = 5;

/// The stage of the cascade that produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStage {
    SimilarToTrack,
    SimilarToTopTrack,
    TopTrack,
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchStage::SimilarToTrack => "similar tracks",
            SearchStage::SimilarToTopTrack => "tracks similar to top tracks",
            SearchStage::TopTrack => "top tracks",
        };
        write!(f, "{}", s)
    }
}

/// Result of one AutoDJ run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoDjOutcome {
    Added {
        stage: SearchStage,
        items: Vec<PlaylistItem>,
    },
    NoMatch,
}

impl AutoDjOutcome {
    /// Items appended to the playlist, empty for [`AutoDjOutcome::NoMatch`].
    pub fn items(&self) -> &[PlaylistItem] {
        match self {
            AutoDjOutcome::Added { items, .. } => items,
            AutoDjOutcome::NoMatch => &[],
        }
    }
}

/// Borrowed view of everything a run needs.
pub struct AutoDj<'a> {
    pub service: &'a dyn ScrobbleService,
    pub catalog: &'a dyn LocalCatalog,
    pub playlist: &'a SharedPlaylist,
    pub settings: &'a Settings,
}

impl AutoDj<'_> {
    /// Runs the cascade for the track `artist` - `title`.
    pub fn run<R: Rng>(&self, artist: &str, title: &str, rng: &mut R) -> AutoDjOutcome {
        let similar = self.similar(artist, title);
        if let Some(outcome) = self.try_add(&similar, SearchStage::SimilarToTrack, rng) {
            return outcome;
        }

        debug!(
            "Unable to match similar tracks for {} - {}: trying tracks similar to top tracks",
            artist, title
        );
        let top_tracks = self.top_tracks(artist);
        for top in top_tracks.iter().take(TOP_TRACK_LIMIT) {
            let similar = self.similar(&top.artist, &top.title);
            if let Some(outcome) = self.try_add(&similar, SearchStage::SimilarToTopTrack, rng) {
                return outcome;
            }
        }

        debug!(
            "Unable to match tracks similar to top tracks of {}: trying top tracks",
            artist
        );
        if let Some(outcome) = self.try_add(&top_tracks, SearchStage::TopTrack, rng) {
            return outcome;
        }

        info!("Auto DJ: Unable to match any tracks for {} - {}", artist, title);
        AutoDjOutcome::NoMatch
    }

    fn try_add<R: Rng>(
        &self,
        candidates: &[RemoteTrack],
        stage: SearchStage,
        rng: &mut R,
    ) -> Option<AutoDjOutcome> {
        if candidates.is_empty() {
            return None;
        }
        let matches = cross_reference(candidates, self.catalog, self.playlist, self.settings);
        if matches.is_empty() {
            return None;
        }
        debug!("Auto DJ: {} local matches from {}", matches.len(), stage);
        let items = add_recommendations(
            matches,
            self.playlist,
            self.settings.randomness,
            self.settings.avoid_duplicates,
            rng,
        );
        Some(AutoDjOutcome::Added { stage, items })
    }

    fn similar(&self, artist: &str, title: &str) -> Vec<RemoteTrack> {
        let what = format!("similar tracks for {} - {}", artist, title);
        or_empty(self.service.similar_tracks(artist, title), &what)
    }

    fn top_tracks(&self, artist: &str) -> Vec<RemoteTrack> {
        let what = format!("top tracks for {}", artist);
        or_empty(self.service.artist_top_tracks(artist), &what)
    }
}

/// Turns a failed lookup into an empty stage, logged by severity.
fn or_empty(result: Result<Vec<RemoteTrack>>, what: &str) -> Vec<RemoteTrack> {
    match result {
        Ok(tracks) => tracks,
        Err(e) if e.code == ErrorCode::InvalidParameters => {
            debug!("Auto DJ: Unable to get {}: {}", what, e.message);
            Vec::new()
        }
        Err(e) => {
            error!("Auto DJ: Error getting {}: {}", what, e);
            Vec::new()
        }
    }
}
