//! Daemon configuration module.
//!
//! [`Settings`] is an immutable snapshot read once at startup from a
//! [`SettingsStore`]. Components receive the snapshot (or a [`SettingsHandle`]
//! to fetch the current one); a reload replaces the snapshot instead of
//! mutating it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

use crate::error::{Result, ScrobblerError};

/// Setting keys recognised by [`Settings::from_store`].
pub mod keys {
    pub const RANDOMNESS: &str = "randomness";
    pub const ALLOW_DIFFERENT_VERSIONS: &str = "allowDifferentVersions";
    pub const ANNOUNCE: &str = "announce";
    pub const SCROBBLE: &str = "scrobble";
    pub const AVOID_DUPLICATES: &str = "avoidDuplicates";
    pub const AUTO_DJ: &str = "autoDJ";
    pub const CACHE_PATH: &str = "cachePath";
    pub const CATALOG_PATH: &str = "catalogPath";
    pub const WORKERS: &str = "workers";
    pub const QUEUE_CAPACITY: &str = "queueCapacity";
    pub const API_KEY: &str = "apiKey";
    pub const API_SECRET: &str = "apiSecret";
    pub const SESSION_KEY: &str = "sessionKey";
    pub const ENDPOINT: &str = "endpoint";

    /// Every key, paired with its environment variable.
    pub const ENV_VARS: &[(&str, &str)] = &[
        (RANDOMNESS, "SCROBBLED_RANDOMNESS"),
        (ALLOW_DIFFERENT_VERSIONS, "SCROBBLED_ALLOW_DIFFERENT_VERSIONS"),
        (ANNOUNCE, "SCROBBLED_ANNOUNCE"),
        (SCROBBLE, "SCROBBLED_SCROBBLE"),
        (AVOID_DUPLICATES, "SCROBBLED_AVOID_DUPLICATES"),
        (AUTO_DJ, "SCROBBLED_AUTO_DJ"),
        (CACHE_PATH, "SCROBBLED_CACHE_PATH"),
        (CATALOG_PATH, "SCROBBLED_CATALOG_PATH"),
        (WORKERS, "SCROBBLED_WORKERS"),
        (QUEUE_CAPACITY, "SCROBBLED_QUEUE_CAPACITY"),
        (API_KEY, "LASTFM_API_KEY"),
        (API_SECRET, "LASTFM_API_SECRET"),
        (SESSION_KEY, "LASTFM_SESSION_KEY"),
        (ENDPOINT, "LASTFM_ENDPOINT"),
    ];
}

pub const DEFAULT_RANDOMNESS: usize = 100;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;
pub const DEFAULT_ENDPOINT: &str = "https://ws.audioscrobbler.com/2.0/";

/// Read-only key/value access to stored settings.
pub trait SettingsStore {
    /// Returns the raw value for `key`, if set.
    fn get_str(&self, key: &str) -> Option<String>;

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_str(key) {
            None => default,
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    warn!("Ignoring invalid boolean for {}: {:?}", key, other);
                    default
                }
            },
        }
    }

    fn get_usize(&self, key: &str, default: usize) -> usize {
        match self.get_str(key) {
            None => default,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!("Ignoring invalid number for {}: {:?}", key, raw);
                default
            }),
        }
    }
}

/// Settings read from environment variables (see [`keys::ENV_VARS`]).
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvStore;

impl SettingsStore for EnvStore {
    fn get_str(&self, key: &str) -> Option<String> {
        let var = keys::ENV_VARS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)?;
        std::env::var(var).ok()
    }
}

/// Settings read from a flat JSON object, e.g. `{"randomness": 50, "announce": false}`.
#[derive(Debug, Default, Clone)]
pub struct FileStore {
    values: HashMap<String, String>,
}

impl FileStore {
    /// Loads a settings file. Nested values are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrobblerError::invalid_config(format!(
                "Failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| {
            ScrobblerError::invalid_config(format!(
                "Failed to parse settings file {}: {}",
                path.display(),
                e.message
            ))
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let json: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|e| ScrobblerError::invalid_config(e.to_string()))?;
        let values = json
            .into_iter()
            .filter_map(|(k, v)| {
                let raw = match v {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Bool(b) => b.to_string(),
                    serde_json::Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                Some((k, raw))
            })
            .collect();
        Ok(Self { values })
    }
}

impl SettingsStore for FileStore {
    fn get_str(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Looks up a key in the first store, then the second.
pub struct Layered<'a>(pub &'a dyn SettingsStore, pub &'a dyn SettingsStore);

impl SettingsStore for Layered<'_> {
    fn get_str(&self, key: &str) -> Option<String> {
        self.0.get_str(key).or_else(|| self.1.get_str(key))
    }
}

/// Credentials and endpoint for the Last.fm web service.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastFmCredentials {
    pub api_key: String,
    pub api_secret: String,
    /// Session key of the authenticated user; required for submissions.
    pub session_key: String,
    pub endpoint: String,
}

impl Default for LastFmCredentials {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            session_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl std::fmt::Debug for LastFmCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LastFmCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("session_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Configuration snapshot for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Send now-playing announcements when playback starts.
    pub announce: bool,

    /// Scrobble tracks once they have been listened to long enough.
    pub scrobble: bool,

    /// Prefer AutoDJ matches that are not already on the playlist.
    pub avoid_duplicates: bool,

    /// Keep several files of the same artist and title as AutoDJ candidates.
    pub allow_multiple_versions: bool,

    /// Upper bound of the window AutoDJ picks from.
    pub randomness: usize,

    /// Extend the playlist with similar tracks when playback starts.
    pub auto_dj: bool,

    /// Path of the offline cache file.
    /// If None, uses the platform-specific default data location.
    pub cache_path: Option<PathBuf>,

    /// Path of the local catalog file.
    pub catalog_path: Option<PathBuf>,

    /// Number of background worker threads.
    pub workers: usize,

    /// Maximum number of pending background tasks.
    pub queue_capacity: usize,

    pub lastfm: LastFmCredentials,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            announce: true,
            scrobble: true,
            avoid_duplicates: true,
            allow_multiple_versions: true,
            randomness: DEFAULT_RANDOMNESS,
            auto_dj: false,
            cache_path: None,
            catalog_path: None,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            lastfm: LastFmCredentials::default(),
        }
    }
}

impl Settings {
    /// Reads a snapshot from a store, falling back to defaults for unset keys.
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();
        let path = |key: &str| store.get_str(key).map(PathBuf::from);
        let string = |key: &str, default: String| store.get_str(key).unwrap_or(default);

        Self {
            announce: store.get_bool(keys::ANNOUNCE, defaults.announce),
            scrobble: store.get_bool(keys::SCROBBLE, defaults.scrobble),
            avoid_duplicates: store.get_bool(keys::AVOID_DUPLICATES, defaults.avoid_duplicates),
            allow_multiple_versions: store.get_bool(
                keys::ALLOW_DIFFERENT_VERSIONS,
                defaults.allow_multiple_versions,
            ),
            randomness: store.get_usize(keys::RANDOMNESS, defaults.randomness),
            auto_dj: store.get_bool(keys::AUTO_DJ, defaults.auto_dj),
            cache_path: path(keys::CACHE_PATH),
            catalog_path: path(keys::CATALOG_PATH),
            workers: store.get_usize(keys::WORKERS, defaults.workers),
            queue_capacity: store.get_usize(keys::QUEUE_CAPACITY, defaults.queue_capacity),
            lastfm: LastFmCredentials {
                api_key: string(keys::API_KEY, defaults.lastfm.api_key),
                api_secret: string(keys::API_SECRET, defaults.lastfm.api_secret),
                session_key: string(keys::SESSION_KEY, defaults.lastfm.session_key),
                endpoint: string(keys::ENDPOINT, defaults.lastfm.endpoint),
            },
        }
    }

    /// Reads a snapshot from environment variables only.
    pub fn from_env() -> Self {
        Self::from_store(&EnvStore)
    }

    /// Reads a snapshot from environment variables layered over a settings file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        match file {
            None => Ok(Self::from_env()),
            Some(path) => {
                let file_store = FileStore::load(path)?;
                Ok(Self::from_store(&Layered(&EnvStore, &file_store)))
            }
        }
    }

    /// Returns the effective cache path, using platform defaults if not specified.
    pub fn effective_cache_path(&self) -> PathBuf {
        if let Some(ref path) = self.cache_path {
            path.clone()
        } else {
            default_cache_path()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.randomness == 0 {
            return Err(ScrobblerError::invalid_config("randomness must be > 0"));
        }
        if self.workers == 0 || self.workers > 64 {
            return Err(ScrobblerError::invalid_config(format!(
                "workers must be between 1 and 64, got {}",
                self.workers
            )));
        }
        if self.queue_capacity == 0 {
            return Err(ScrobblerError::invalid_config("queueCapacity must be > 0"));
        }
        Ok(())
    }
}

/// Shared reference to the current settings snapshot.
///
/// Readers get an `Arc` to an immutable snapshot; [`SettingsHandle::replace`]
/// swaps in a new one without touching snapshots already handed out.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Arc<Settings>>>,
}

impl SettingsHandle {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    pub fn current(&self) -> Arc<Settings> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, settings: Settings) {
        let next = Arc::new(settings);
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

/// Returns the platform-specific default offline cache path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Application Support/scrobbled/pending-scrobbles.json
/// - Linux: ~/.local/share/scrobbled/pending-scrobbles.json
/// - Windows: C:\Users\<user>\AppData\Roaming\scrobbled\data\pending-scrobbles.json
fn default_cache_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "scrobbled") {
        proj_dirs.data_dir().join("pending-scrobbles.json")
    } else {
        // Fallback to current directory
        PathBuf::from("./pending-scrobbles.json")
    }
}
