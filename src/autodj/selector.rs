//! Picks which matched tracks are appended to the playlist.

use rand::Rng;
use tracing::{debug, info};

use crate::playlist::SharedPlaylist;
use crate::types::{CatalogTrack, PlaylistItem};

/// Number of upcoming tracks AutoDJ tries to keep queued.
pub const RESERVE_SIZE: usize = 5;

/// Appends recommendations from `matches` and returns the inserted items.
///
/// One track is added, or enough to bring the tracks after the current one
/// up to [`RESERVE_SIZE`], never more than there are matches. Each pick is
/// uniform over the first `randomness` remaining matches, and a picked
/// track is removed from the pool. With `avoid_duplicates`, matches whose
/// file is already on the playlist are dropped first, unless that would
/// leave nothing. The playlist stays locked throughout.
pub fn add_recommendations<R: Rng>(
    mut matches: Vec<CatalogTrack>,
    playlist: &SharedPlaylist,
    randomness: usize,
    avoid_duplicates: bool,
    rng: &mut R,
) -> Vec<PlaylistItem> {
    let mut playlist = playlist.lock();

    if avoid_duplicates && matches.iter().any(|m| !playlist.contains_file(&m.file)) {
        let before = matches.len();
        matches.retain(|m| !playlist.contains_file(&m.file));
        if matches.len() < before {
            debug!(
                "Auto DJ: {} matches were queued meanwhile",
                before - matches.len()
            );
        }
    }

    let remaining = playlist.remaining_after_current();
    let wanted = if remaining < RESERVE_SIZE {
        RESERVE_SIZE - remaining
    } else {
        1
    };
    let count = wanted.min(matches.len());
    info!(
        "Auto DJ: Matched {} local songs. Attempting to add {} tracks",
        matches.len(),
        count
    );

    let mut added = Vec::with_capacity(count);
    for _ in 0..count {
        let window = matches.len().min(randomness).max(1);
        let pick = matches.remove(rng.gen_range(0..window));
        let item = PlaylistItem::recommended(&pick);
        playlist.push(item.clone());
        info!("Auto DJ: Added to playlist: {} - {}", pick.artist, pick.title);
        added.push(item);
    }
    added
}
