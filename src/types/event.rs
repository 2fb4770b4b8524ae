//! Player lifecycle events.

use serde::{Deserialize, Serialize};

/// Stop time used for `Ended` events: the track played to completion.
///
/// High enough that the four-minute rule is always satisfied.
pub const PLAYED_TO_COMPLETION: u32 = u32::MAX;

/// Kind of media the player is handling. Only [`MediaKind::Music`] is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Music,
    Video,
    Radio,
    Tv,
    Other,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Music => "music",
            MediaKind::Video => "video",
            MediaKind::Radio => "radio",
            MediaKind::Tv => "tv",
            MediaKind::Other => "other",
        }
    }

    /// Parses a media kind; unknown names map to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "music" | "audio" => MediaKind::Music,
            "video" => MediaKind::Video,
            "radio" => MediaKind::Radio,
            "tv" => MediaKind::Tv,
            _ => MediaKind::Other,
        }
    }
}

/// An event emitted by the media player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// Something started playing.
    Started { kind: MediaKind, file: String },
    /// The playing item was replaced (track finished or user skipped).
    Changed {
        kind: MediaKind,
        stop_time: u32,
        file: String,
    },
    /// The user stopped playback part way through.
    Stopped {
        kind: MediaKind,
        stop_time: u32,
        file: String,
    },
    /// Playback came to its natural end.
    Ended { kind: MediaKind, file: String },
}

impl PlayerEvent {
    pub fn kind(&self) -> MediaKind {
        match self {
            PlayerEvent::Started { kind, .. }
            | PlayerEvent::Changed { kind, .. }
            | PlayerEvent::Stopped { kind, .. }
            | PlayerEvent::Ended { kind, .. } => *kind,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            PlayerEvent::Started { file, .. }
            | PlayerEvent::Changed { file, .. }
            | PlayerEvent::Stopped { file, .. }
            | PlayerEvent::Ended { file, .. } => file,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::Started { .. } => "started",
            PlayerEvent::Changed { .. } => "changed",
            PlayerEvent::Stopped { .. } => "stopped",
            PlayerEvent::Ended { .. } => "ended",
        }
    }

    /// Builds the session this event closes, if it closes one.
    ///
    /// `Started` opens a session and returns `None`.
    pub fn closing_session(&self) -> Option<PlaybackSession> {
        match self {
            PlayerEvent::Started { .. } => None,
            PlayerEvent::Changed {
                kind,
                stop_time,
                file,
            }
            | PlayerEvent::Stopped {
                kind,
                stop_time,
                file,
            } => Some(PlaybackSession {
                kind: *kind,
                file: file.clone(),
                stop_time: *stop_time,
            }),
            PlayerEvent::Ended { kind, file } => Some(PlaybackSession {
                kind: *kind,
                file: file.clone(),
                stop_time: PLAYED_TO_COMPLETION,
            }),
        }
    }
}

/// One playback of one file, as seen when it stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSession {
    pub kind: MediaKind,
    pub file: String,
    /// Seconds listened before the session ended.
    pub stop_time: u32,
}
