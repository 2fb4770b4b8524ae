//! Core types for scrobbled.
//!
//! This module re-exports the data model shared by every component:
//! - [`TrackTags`] / [`TrackIdentity`]: raw and validated track metadata
//! - [`PlayerEvent`] / [`PlaybackSession`]: player lifecycle input
//! - [`CachedSubmission`]: a scrobble waiting in the offline cache
//! - [`PlaylistItem`]: an entry of the active playlist

mod event;
mod playlist_item;
mod submission;
mod track;

pub use event::{MediaKind, PlaybackSession, PlayerEvent, PLAYED_TO_COMPLETION};
pub use playlist_item::{ItemSource, PlaylistItem, AUTODJ_SOURCE_DESCRIPTION};
pub use submission::{compute_submission_id, CachedSubmission};
pub use track::{CatalogTrack, TagProblem, TrackIdentity, TrackTags};
