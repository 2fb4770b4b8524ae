//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::SystemTime;

use crate::catalog::LocalCatalog;
use crate::dispatch::{BackgroundTask, TaskSink};
use crate::error::{ErrorCode, Result, ScrobblerError};
use crate::service::{RemoteTrack, ScrobbleService};
use crate::types::{CatalogTrack, TrackIdentity};

/// A call received by [`MockService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Announce(String),
    Scrobble(String),
    Similar(String, String),
    TopTracks(String),
}

type Canned = std::result::Result<Vec<RemoteTrack>, ErrorCode>;

/// Recording scrobble service with configurable answers.
///
/// Unconfigured lookups return an empty list; unconfigured submissions succeed.
#[derive(Default)]
pub(crate) struct MockService {
    calls: Mutex<Vec<Call>>,
    similar: Mutex<HashMap<(String, String), Canned>>,
    top_tracks: Mutex<HashMap<String, Canned>>,
    announce_failure: Mutex<Option<ErrorCode>>,
    /// Failures keyed by track title.
    scrobble_failures: Mutex<HashMap<String, ErrorCode>>,
    /// Failures consumed in order by the next scrobbles, whatever the title.
    next_scrobble_failures: Mutex<VecDeque<ErrorCode>>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_similar(self, artist: &str, title: &str, tracks: Vec<RemoteTrack>) -> Self {
        self.similar
            .lock()
            .unwrap()
            .insert((artist.into(), title.into()), Ok(tracks));
        self
    }

    pub fn failing_similar(self, artist: &str, title: &str, code: ErrorCode) -> Self {
        self.similar
            .lock()
            .unwrap()
            .insert((artist.into(), title.into()), Err(code));
        self
    }

    pub fn with_top_tracks(self, artist: &str, tracks: Vec<RemoteTrack>) -> Self {
        self.top_tracks.lock().unwrap().insert(artist.into(), Ok(tracks));
        self
    }

    pub fn failing_top_tracks(self, artist: &str, code: ErrorCode) -> Self {
        self.top_tracks.lock().unwrap().insert(artist.into(), Err(code));
        self
    }

    pub fn failing_announce(self, code: ErrorCode) -> Self {
        *self.announce_failure.lock().unwrap() = Some(code);
        self
    }

    pub fn failing_scrobble_of(self, title: &str, code: ErrorCode) -> Self {
        self.scrobble_failures.lock().unwrap().insert(title.into(), code);
        self
    }

    pub fn fail_next_scrobble(&self, code: ErrorCode) {
        self.next_scrobble_failures.lock().unwrap().push_back(code);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scrobble_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Scrobble(_)))
    }

    pub fn announce_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Announce(_)))
    }

    pub fn similar_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Similar(..)))
    }

    pub fn top_track_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::TopTracks(_)))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn fail(code: ErrorCode) -> ScrobblerError {
    ScrobblerError::new(code, "mock failure")
}

impl ScrobbleService for MockService {
    fn announce_now_playing(&self, track: &TrackIdentity) -> Result<()> {
        self.record(Call::Announce(track.title.clone()));
        match *self.announce_failure.lock().unwrap() {
            Some(code) => Err(fail(code)),
            None => Ok(()),
        }
    }

    fn scrobble(&self, track: &TrackIdentity, _played_at: SystemTime) -> Result<()> {
        self.record(Call::Scrobble(track.title.clone()));
        if let Some(code) = self.next_scrobble_failures.lock().unwrap().pop_front() {
            return Err(fail(code));
        }
        match self.scrobble_failures.lock().unwrap().get(&track.title) {
            Some(code) => Err(fail(*code)),
            None => Ok(()),
        }
    }

    fn similar_tracks(&self, artist: &str, title: &str) -> Result<Vec<RemoteTrack>> {
        self.record(Call::Similar(artist.into(), title.into()));
        match self.similar.lock().unwrap().get(&(artist.into(), title.into())) {
            Some(Ok(tracks)) => Ok(tracks.clone()),
            Some(Err(code)) => Err(fail(*code)),
            None => Ok(Vec::new()),
        }
    }

    fn artist_top_tracks(&self, artist: &str) -> Result<Vec<RemoteTrack>> {
        self.record(Call::TopTracks(artist.into()));
        match self.top_tracks.lock().unwrap().get(artist) {
            Some(Ok(tracks)) => Ok(tracks.clone()),
            Some(Err(code)) => Err(fail(*code)),
            None => Ok(Vec::new()),
        }
    }
}

/// Task sink that keeps submitted tasks instead of running them.
#[derive(Default)]
pub(crate) struct RecordingSink {
    pub tasks: Mutex<Vec<BackgroundTask>>,
    /// Rejects every submission as if the queue were full.
    pub full: bool,
}

impl RecordingSink {
    pub fn full() -> Self {
        Self {
            full: true,
            ..Self::default()
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tasks.lock().unwrap().iter().map(|t| t.name()).collect()
    }
}

impl TaskSink for RecordingSink {
    fn submit(&self, task: BackgroundTask) -> Result<()> {
        if self.full {
            return Err(ScrobblerError::queue_full(0));
        }
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}

/// Catalog whose every query fails.
pub(crate) struct BrokenCatalog;

impl LocalCatalog for BrokenCatalog {
    fn query_by_artist_and_title(&self, _artist: &str, _title: &str) -> Result<Vec<CatalogTrack>> {
        Err(ScrobblerError::catalog_failed("catalog unavailable"))
    }
}

pub(crate) fn catalog_track(file: &str, artist: &str, title: &str) -> CatalogTrack {
    CatalogTrack {
        file: file.into(),
        artist: artist.into(),
        album_artist: String::new(),
        album: String::new(),
        title: title.into(),
        duration_sec: 240,
    }
}

pub(crate) fn identity(artist: &str, title: &str) -> TrackIdentity {
    TrackIdentity {
        artist: artist.into(),
        title: title.into(),
        album: String::new(),
        duration_sec: 240,
    }
}
