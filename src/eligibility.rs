//! Scrobble and now-playing eligibility.
//!
//! Last.fm asks clients not to scrobble tracks shorter than 30 seconds, and
//! to scrobble only once the track has been listened to for four minutes or
//! half its length, whichever comes first.

use std::fmt;

use crate::config::Settings;
use crate::types::{TagProblem, TrackTags};

/// Tracks shorter than this are never scrobbled.
pub const MIN_TRACK_SECONDS: u32 = 30;

/// Listening this long always qualifies, whatever the track length.
pub const SCROBBLE_AFTER_SECONDS: u32 = 240;

/// Why a track cannot be scrobbled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    MissingTitle,
    MissingArtist,
    TooShort,
    NotListenedEnough,
}

impl From<TagProblem> for IneligibleReason {
    fn from(problem: TagProblem) -> Self {
        match problem {
            TagProblem::MissingTitle => IneligibleReason::MissingTitle,
            TagProblem::MissingArtist => IneligibleReason::MissingArtist,
        }
    }
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IneligibleReason::MissingTitle => write!(f, "no title for track"),
            IneligibleReason::MissingArtist => write!(f, "no tags: no artist or album artist"),
            IneligibleReason::TooShort => {
                write!(f, "shorter than {} seconds", MIN_TRACK_SECONDS)
            }
            IneligibleReason::NotListenedEnough => write!(
                f,
                "played less than {} seconds and less than half its length",
                SCROBBLE_AFTER_SECONDS
            ),
        }
    }
}

/// Outcome of [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The track cannot be identified; nothing may be sent.
    Ineligible(IneligibleReason),
    /// The track is identifiable but this play does not count as a scrobble.
    NowPlayingOnly(IneligibleReason),
    /// The play counts.
    Scrobble,
}

impl Eligibility {
    pub fn can_scrobble(&self) -> bool {
        matches!(self, Eligibility::Scrobble)
    }

    pub fn can_announce(&self) -> bool {
        !matches!(self, Eligibility::Ineligible(_))
    }

    /// The reason this play will not be scrobbled, if any.
    pub fn reason(&self) -> Option<IneligibleReason> {
        match self {
            Eligibility::Ineligible(r) | Eligibility::NowPlayingOnly(r) => Some(*r),
            Eligibility::Scrobble => None,
        }
    }
}

/// Decides whether a play of `elapsed_sec` seconds is worth scrobbling.
pub fn evaluate(tags: &TrackTags, elapsed_sec: u32) -> Eligibility {
    if let Err(problem) = tags.identity() {
        return Eligibility::Ineligible(problem.into());
    }

    if tags.duration_sec < MIN_TRACK_SECONDS {
        return Eligibility::NowPlayingOnly(IneligibleReason::TooShort);
    }

    // Half the length in whole seconds, rounded down.
    let half = tags.duration_sec / 2;
    if elapsed_sec < SCROBBLE_AFTER_SECONDS && elapsed_sec < half {
        return Eligibility::NowPlayingOnly(IneligibleReason::NotListenedEnough);
    }

    Eligibility::Scrobble
}

/// Returns true if a now-playing announcement should be sent for these tags.
///
/// Independent of elapsed time: announcements go out when playback starts.
pub fn should_announce(tags: &TrackTags, settings: &Settings) -> bool {
    settings.announce && tags.identity().is_ok()
}
