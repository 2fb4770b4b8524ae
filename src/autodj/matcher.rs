//! Cross-referencing remote candidates with the local catalog.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::catalog::{sanitize, LocalCatalog};
use crate::config::Settings;
use crate::playlist::SharedPlaylist;
use crate::service::RemoteTrack;
use crate::types::CatalogTrack;

/// Returns the local tracks matching any of `candidates`.
///
/// Each candidate is looked up with sanitized artist and title. A failing
/// lookup is logged and skipped. When `avoid_duplicates` is set, matches
/// already on the playlist are dropped, unless that would leave nothing.
/// When `allow_multiple_versions` is off, only the first match per
/// (artist, title) is kept.
pub fn cross_reference(
    candidates: &[RemoteTrack],
    catalog: &dyn LocalCatalog,
    playlist: &SharedPlaylist,
    settings: &Settings,
) -> Vec<CatalogTrack> {
    let mut matches = Vec::new();
    for candidate in candidates {
        let artist = sanitize(&candidate.artist);
        let title = sanitize(&candidate.title);
        match catalog.query_by_artist_and_title(&artist, &title) {
            Ok(found) => matches.extend(found),
            Err(e) => warn!("Catalog lookup failed for {} - {}: {}", artist, title, e),
        }
    }

    if settings.avoid_duplicates && !matches.is_empty() {
        let fresh: Vec<CatalogTrack> = {
            let playlist = playlist.lock();
            matches
                .iter()
                .filter(|t| !playlist.contains_file(&t.file))
                .cloned()
                .collect()
        };
        if !fresh.is_empty() {
            if fresh.len() < matches.len() {
                debug!(
                    "Skipping {} matches already on the playlist",
                    matches.len() - fresh.len()
                );
            }
            matches = fresh;
        }
    }

    if !settings.allow_multiple_versions {
        let mut seen = HashSet::new();
        matches.retain(|t| seen.insert((t.artist.clone(), t.title.clone())));
    }

    matches
}
