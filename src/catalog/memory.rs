//! In-memory catalog loaded from a JSON file.

use std::path::Path;

use tracing::info;

use crate::error::{Result, ScrobblerError};
use crate::types::CatalogTrack;

use super::{sanitize, LocalCatalog};

/// Markers that join several artists in one artist field.
const FEATURING: &[&str] = &[" feat. ", " ft. ", " featuring "];

/// Catalog held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    tracks: Vec<CatalogTrack>,
}

impl MemoryCatalog {
    pub fn new(tracks: Vec<CatalogTrack>) -> Self {
        Self { tracks }
    }

    /// Loads a catalog from a JSON array of tracks.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrobblerError::catalog_failed(format!(
                "Failed to read catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        let tracks: Vec<CatalogTrack> = serde_json::from_str(&content).map_err(|e| {
            ScrobblerError::catalog_failed(format!(
                "Failed to parse catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        info!("Loaded {} tracks from catalog {}", tracks.len(), path.display());
        Ok(Self::new(tracks))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl LocalCatalog for MemoryCatalog {
    fn query_by_artist_and_title(&self, artist: &str, title: &str) -> Result<Vec<CatalogTrack>> {
        if artist.is_empty() || title.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .tracks
            .iter()
            .filter(|t| sanitize(&t.title) == title && artist_matches(&t.artist, artist))
            .cloned()
            .collect())
    }
}

/// Case-insensitive match of `query` against the whole artist field or any
/// single artist listed in it.
fn artist_matches(field: &str, query: &str) -> bool {
    let query = normalize(query);
    if normalize(&sanitize(field)) == query {
        return true;
    }
    split_artists(field)
        .into_iter()
        .any(|name| normalize(&sanitize(&name)) == query)
}

fn split_artists(field: &str) -> Vec<String> {
    let mut names: Vec<String> = field
        .split(['|', ';'])
        .map(|s| s.to_string())
        .collect();
    for marker in FEATURING {
        names = names
            .iter()
            .flat_map(|name| {
                let lower = name.to_lowercase();
                match lower.find(marker) {
                    // Lowercasing may change byte lengths for non-ASCII text.
                    Some(pos) if lower.len() == name.len() => vec![
                        name[..pos].to_string(),
                        name[pos + marker.len()..].to_string(),
                    ],
                    _ => vec![name.clone()],
                }
            })
            .collect();
    }
    names
}

fn normalize(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
