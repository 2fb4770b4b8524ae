//! Active playlist.
//!
//! The playlist is shared between the router (lookup by file), the AutoDJ
//! matcher (duplicate checks) and the selector (append). All of them go
//! through the [`SharedPlaylist`] mutex; a read-then-mutate sequence must
//! hold the lock for its whole duration.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::PlaylistItem;

/// The playlist currently loaded in the player.
#[derive(Debug, Default, Clone)]
pub struct Playlist {
    items: Vec<PlaylistItem>,
    /// Index of the item being played, if any.
    current: Option<usize>,
}

impl Playlist {
    pub fn new(items: Vec<PlaylistItem>, current: Option<usize>) -> Self {
        let mut playlist = Self {
            items,
            current: None,
        };
        playlist.set_current(current);
        playlist
    }

    pub fn items(&self) -> &[PlaylistItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Sets the playing index. Out-of-range indices clear it.
    pub fn set_current(&mut self, index: Option<usize>) {
        self.current = index.filter(|i| *i < self.items.len());
    }

    pub fn push(&mut self, item: PlaylistItem) {
        self.items.push(item);
    }

    /// Removes the item at `index`, keeping the current index on the same item.
    pub fn remove(&mut self, index: usize) -> Option<PlaylistItem> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.current = match self.current {
            Some(c) if c == index => None,
            Some(c) if c > index => Some(c - 1),
            other => other,
        };
        Some(item)
    }

    /// Replaces the whole playlist.
    pub fn replace(&mut self, items: Vec<PlaylistItem>, current: Option<usize>) {
        self.items = items;
        self.set_current(current);
    }

    /// Returns the first item whose file reference equals `file`.
    pub fn find_by_file(&self, file: &str) -> Option<&PlaylistItem> {
        self.items.iter().find(|item| item.file == file)
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.find_by_file(file).is_some()
    }

    /// Number of items after the current one. Without a current item, every item remains.
    pub fn remaining_after_current(&self) -> usize {
        match self.current {
            Some(c) => self.items.len().saturating_sub(c + 1),
            None => self.items.len(),
        }
    }
}

/// Playlist shared between the router and background tasks.
#[derive(Debug, Default, Clone)]
pub struct SharedPlaylist {
    inner: Arc<Mutex<Playlist>>,
}

impl SharedPlaylist {
    pub fn new(playlist: Playlist) -> Self {
        Self {
            inner: Arc::new(Mutex::new(playlist)),
        }
    }

    /// Locks the playlist. A poisoned lock is recovered; the playlist has no
    /// invariant a panicking writer could leave half-applied.
    pub fn lock(&self) -> MutexGuard<'_, Playlist> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns a copy of the item playing `file`, if it is on the playlist.
    pub fn find_by_file(&self, file: &str) -> Option<PlaylistItem> {
        self.lock().find_by_file(file).cloned()
    }

    pub fn snapshot(&self) -> Playlist {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(n: usize) -> Vec<PlaylistItem> {
        (0..n)
            .map(|i| PlaylistItem::new(format!("/music/{}.mp3", i), None))
            .collect()
    }

    #[test]
    fn remaining_after_current() {
        let mut playlist = Playlist::new(items(6), Some(2));
        assert_eq!(playlist.remaining_after_current(), 3);

        playlist.set_current(Some(5));
        assert_eq!(playlist.remaining_after_current(), 0);

        playlist.set_current(None);
        assert_eq!(playlist.remaining_after_current(), 6);
    }

    #[test]
    fn out_of_range_current_is_cleared() {
        let playlist = Playlist::new(items(2), Some(7));
        assert_eq!(playlist.current_index(), None);
    }

    #[test]
    fn remove_keeps_current_item() {
        let mut playlist = Playlist::new(items(4), Some(2));
        let removed = playlist.remove(0).unwrap();
        assert_eq!(removed.file, "/music/0.mp3");
        assert_eq!(playlist.current_index(), Some(1));
        assert_eq!(playlist.items()[1].file, "/music/2.mp3");

        playlist.remove(1);
        assert_eq!(playlist.current_index(), None);
        assert!(playlist.remove(10).is_none());
    }

    #[test]
    fn find_by_file() {
        let shared = SharedPlaylist::new(Playlist::new(items(3), None));
        assert!(shared.find_by_file("/music/1.mp3").is_some());
        assert!(shared.find_by_file("/music/9.mp3").is_none());
        assert!(shared.lock().contains_file("/music/2.mp3"));
    }

    #[test]
    fn shared_clones_see_the_same_playlist() {
        let shared = SharedPlaylist::default();
        let other = shared.clone();
        other.lock().push(PlaylistItem::new("/a.mp3", None));
        assert_eq!(shared.snapshot().len(), 1);
    }
}
