//! Playback event routing.
//!
//! [`EventBus`] carries player events to any number of listeners.
//! [`PlaybackRouter`] is the listener that turns events into background
//! tasks: an announcement and an AutoDJ run when a track starts, a scrobble
//! when it stops. It never performs network I/O itself and never fails
//! back into the player.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use tracing::{debug, error, info, warn};

use crate::config::SettingsHandle;
use crate::dispatch::{BackgroundTask, TaskSink};
use crate::eligibility::{evaluate, should_announce};
use crate::error::{Result, ScrobblerError};
use crate::playlist::SharedPlaylist;
use crate::types::{MediaKind, PlaybackSession, PlayerEvent, TrackIdentity, TrackTags};

/// Receives player events.
pub trait PlayerEventListener: Send + Sync {
    fn on_event(&self, event: &PlayerEvent);
}

/// Publish/subscribe hub for player events.
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<Vec<Arc<dyn PlayerEventListener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn PlayerEventListener>) {
        match self.listeners.write() {
            Ok(mut listeners) => listeners.push(listener),
            Err(poisoned) => poisoned.into_inner().push(listener),
        }
    }

    /// Delivers `event` to every listener. A panicking listener is logged
    /// and skipped.
    pub fn publish(&self, event: &PlayerEvent) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for listener in listeners {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if delivered.is_err() {
                error!("Listener panicked while handling {} event", event.name());
            }
        }
    }
}

/// Turns player events into background tasks.
pub struct PlaybackRouter {
    playlist: SharedPlaylist,
    settings: SettingsHandle,
    tasks: Arc<dyn TaskSink>,
}

impl PlaybackRouter {
    pub fn new(playlist: SharedPlaylist, settings: SettingsHandle, tasks: Arc<dyn TaskSink>) -> Self {
        Self {
            playlist,
            settings,
            tasks,
        }
    }

    fn on_started(&self, file: &str) {
        let settings = self.settings.current();
        if !(settings.announce || settings.auto_dj) {
            return;
        }

        let tags = match self.resolve(file) {
            Some(tags) => tags,
            None => {
                info!("Unable to process {} as it does not exist in the playlist", file);
                return;
            }
        };
        let track = match identify(file, &tags) {
            Ok(track) => track,
            Err(e) => {
                warn!("{}", e.message);
                return;
            }
        };

        if should_announce(&tags, &settings) {
            self.submit(BackgroundTask::Announce {
                track: track.clone(),
            });
        }
        if settings.auto_dj {
            self.submit(BackgroundTask::AutoDj {
                artist: track.artist,
                title: track.title,
            });
        }
    }

    fn on_session_closed(&self, session: PlaybackSession) {
        if !self.settings.current().scrobble {
            return;
        }

        let tags = match self.resolve(&session.file) {
            Some(tags) => tags,
            None => {
                info!(
                    "Unable to scrobble {} as it does not exist in the playlist",
                    session.file
                );
                return;
            }
        };

        let eligibility = evaluate(&tags, session.stop_time);
        if let Some(reason) = eligibility.reason() {
            if eligibility.can_announce() {
                debug!("Not scrobbling {}: {}", session.file, reason);
            } else {
                info!("Unable to scrobble {}: {}", session.file, reason);
            }
            return;
        }

        match identify(&session.file, &tags) {
            Ok(track) => self.submit(BackgroundTask::Scrobble {
                track,
                played_at: SystemTime::now(),
            }),
            Err(e) => info!("{}", e.message),
        }
    }

    /// Tags of the playlist item playing `file`.
    fn resolve(&self, file: &str) -> Option<TrackTags> {
        self.playlist.find_by_file(file).and_then(|item| item.tags)
    }

    fn submit(&self, task: BackgroundTask) {
        let name = task.name();
        if let Err(e) = self.tasks.submit(task) {
            warn!("Dropping {} task: {}", name, e);
        }
    }
}

/// Validated identity of the track playing `file`.
fn identify(file: &str, tags: &TrackTags) -> Result<TrackIdentity> {
    tags.identity().map_err(|problem| ScrobblerError::invalid_track(file, problem))
}

impl PlayerEventListener for PlaybackRouter {
    fn on_event(&self, event: &PlayerEvent) {
        if event.kind() != MediaKind::Music {
            debug!("Ignoring {} event for {}", event.name(), event.kind().as_str());
            return;
        }
        match event {
            PlayerEvent::Started { file, .. } => self.on_started(file),
            _ => {
                if let Some(session) = event.closing_session() {
                    self.on_session_closed(session);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::ErrorCode;
    use crate::playlist::Playlist;
    use crate::types::{PlaylistItem, PLAYED_TO_COMPLETION};
    use crate::testing::RecordingSink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn playlist() -> SharedPlaylist {
        let untitled = TrackTags::new("", "Band X", 200);
        let mut album_artist_only = TrackTags::new("Song C", "", 200);
        album_artist_only.album_artist = "Band Z".into();
        SharedPlaylist::new(Playlist::new(
            vec![
                PlaylistItem::new("/m/a.mp3", Some(TrackTags::new("Song A", "Band X", 200))),
                PlaylistItem::new("/m/untitled.mp3", Some(untitled)),
                PlaylistItem::new("/m/untagged.mp3", None),
                PlaylistItem::new("/m/c.mp3", Some(album_artist_only)),
                PlaylistItem::new("/m/short.mp3", Some(TrackTags::new("Jingle", "Band X", 20))),
            ],
            Some(0),
        ))
    }

    fn router(settings: Settings) -> (PlaybackRouter, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let router = PlaybackRouter::new(playlist(), SettingsHandle::new(settings), sink.clone());
        (router, sink)
    }

    fn started(file: &str) -> PlayerEvent {
        PlayerEvent::Started {
            kind: MediaKind::Music,
            file: file.into(),
        }
    }

    fn changed(file: &str, stop_time: u32) -> PlayerEvent {
        PlayerEvent::Changed {
            kind: MediaKind::Music,
            stop_time,
            file: file.into(),
        }
    }

    #[test]
    fn started_announces() {
        let (router, sink) = router(Settings::default());
        router.on_event(&started("/m/a.mp3"));
        assert_eq!(
            *sink.tasks.lock().unwrap(),
            vec![BackgroundTask::Announce {
                track: crate::types::TrackIdentity {
                    artist: "Band X".into(),
                    title: "Song A".into(),
                    album: String::new(),
                    duration_sec: 200,
                }
            }]
        );
    }

    #[test]
    fn started_with_autodj_submits_both() {
        let (router, sink) = router(Settings {
            auto_dj: true,
            ..Default::default()
        });
        router.on_event(&started("/m/a.mp3"));
        assert_eq!(sink.names(), vec!["announce", "autodj"]);
    }

    #[test]
    fn autodj_runs_without_announcements() {
        let (router, sink) = router(Settings {
            announce: false,
            auto_dj: true,
            ..Default::default()
        });
        router.on_event(&started("/m/c.mp3"));
        assert_eq!(
            *sink.tasks.lock().unwrap(),
            vec![BackgroundTask::AutoDj {
                artist: "Band Z".into(),
                title: "Song C".into(),
            }]
        );
    }

    #[test]
    fn started_ignored_when_nothing_enabled() {
        let (router, sink) = router(Settings {
            announce: false,
            ..Default::default()
        });
        router.on_event(&started("/m/a.mp3"));
        assert!(sink.names().is_empty());
    }

    #[test]
    fn unresolvable_tracks_are_skipped() {
        let (router, sink) = router(Settings {
            auto_dj: true,
            ..Default::default()
        });
        for file in ["/m/untitled.mp3", "/m/untagged.mp3", "/m/missing.mp3"] {
            router.on_event(&started(file));
            router.on_event(&changed(file, 300));
        }
        assert!(sink.names().is_empty());
    }

    #[test]
    fn untagged_track_is_an_invalid_track_error() {
        let err = identify("/m/untitled.mp3", &TrackTags::new("", "Band X", 200)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTrack);
        assert_eq!(err.message, "Unable to process /m/untitled.mp3: no title for track");

        let track = identify("/m/a.mp3", &TrackTags::new("Song A", "Band X", 200)).unwrap();
        assert_eq!(track.to_string(), "Band X - Song A");
    }

    #[test]
    fn non_music_is_ignored() {
        let (router, sink) = router(Settings {
            auto_dj: true,
            ..Default::default()
        });
        for kind in [MediaKind::Video, MediaKind::Radio, MediaKind::Tv, MediaKind::Other] {
            router.on_event(&PlayerEvent::Started {
                kind,
                file: "/m/a.mp3".into(),
            });
            router.on_event(&PlayerEvent::Ended {
                kind,
                file: "/m/a.mp3".into(),
            });
        }
        assert!(sink.names().is_empty());
    }

    #[test]
    fn scrobbles_only_when_eligible() {
        let (router, sink) = router(Settings::default());
        // Half of 200 seconds not reached.
        router.on_event(&changed("/m/a.mp3", 99));
        assert!(sink.names().is_empty());

        router.on_event(&changed("/m/a.mp3", 100));
        router.on_event(&PlayerEvent::Stopped {
            kind: MediaKind::Music,
            stop_time: 150,
            file: "/m/c.mp3".into(),
        });
        router.on_event(&PlayerEvent::Ended {
            kind: MediaKind::Music,
            file: "/m/short.mp3".into(),
        });
        assert_eq!(sink.names(), vec!["scrobble", "scrobble"]);

        let tasks = sink.tasks.lock().unwrap();
        match &tasks[1] {
            BackgroundTask::Scrobble { track, .. } => assert_eq!(track.artist, "Band Z"),
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn scrobble_time_is_taken_when_the_session_closes() {
        let (router, sink) = router(Settings::default());
        let before = SystemTime::now();
        router.on_event(&changed("/m/a.mp3", 150));
        let after = SystemTime::now();

        let tasks = sink.tasks.lock().unwrap();
        match &tasks[0] {
            BackgroundTask::Scrobble { played_at, .. } => {
                assert!(*played_at >= before && *played_at <= after);
            }
            other => panic!("unexpected task {:?}", other),
        }
    }

    #[test]
    fn ended_counts_as_full_play() {
        let (router, sink) = router(Settings::default());
        router.on_event(&PlayerEvent::Ended {
            kind: MediaKind::Music,
            file: "/m/a.mp3".into(),
        });
        assert_eq!(sink.names(), vec!["scrobble"]);
        assert_eq!(
            PlayerEvent::Ended {
                kind: MediaKind::Music,
                file: String::new()
            }
            .closing_session()
            .map(|s| s.stop_time),
            Some(PLAYED_TO_COMPLETION)
        );
    }

    #[test]
    fn scrobbling_disabled() {
        let (router, sink) = router(Settings {
            scrobble: false,
            ..Default::default()
        });
        router.on_event(&changed("/m/a.mp3", 300));
        assert!(sink.names().is_empty());
    }

    #[test]
    fn settings_reload_applies_to_next_event() {
        let sink = Arc::new(RecordingSink::default());
        let settings = SettingsHandle::new(Settings::default());
        let router = PlaybackRouter::new(playlist(), settings.clone(), sink.clone());

        router.on_event(&changed("/m/a.mp3", 300));
        settings.replace(Settings {
            scrobble: false,
            ..Default::default()
        });
        router.on_event(&changed("/m/a.mp3", 300));

        assert_eq!(sink.names(), vec!["scrobble"]);
    }

    #[test]
    fn full_queue_is_swallowed() {
        let sink = Arc::new(RecordingSink::full());
        let router = PlaybackRouter::new(
            playlist(),
            SettingsHandle::new(Settings::default()),
            sink.clone(),
        );
        router.on_event(&changed("/m/a.mp3", 300));
        assert!(sink.names().is_empty());
    }

    struct Panicking;

    impl PlayerEventListener for Panicking {
        fn on_event(&self, _event: &PlayerEvent) {
            panic!("listener failure");
        }
    }

    struct Counting(AtomicUsize);

    impl PlayerEventListener for Counting {
        fn on_event(&self, _event: &PlayerEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn bus_isolates_panicking_listener() {
        let bus = EventBus::new();
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        bus.subscribe(Arc::new(Panicking));
        bus.subscribe(counter.clone());

        bus.publish(&started("/m/a.mp3"));
        bus.publish(&changed("/m/a.mp3", 10));

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
