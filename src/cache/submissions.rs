//! Persistent queue of submissions waiting to be replayed.
//!
//! The queue lives in memory behind a mutex and is mirrored to a JSON file
//! after every change. Writes go to a temporary file that is then renamed
//! over the real one, so a crash never leaves a half-written cache.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{ErrorCode, Result, ScrobblerError};
use crate::service::ScrobbleService;
use crate::types::CachedSubmission;

/// On-disk layout of the cache file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    entries: Vec<CachedSubmission>,
}

/// Outcome of one replay pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Entries sent to the service.
    pub attempted: usize,
    /// Entries accepted by the service and removed.
    pub delivered: usize,
    /// Entries rejected for good and removed.
    pub discarded: usize,
    /// Entries left queued for a later pass.
    pub retained: usize,
    /// True when nothing was attempted: another pass was running, or the
    /// service was unreachable.
    pub skipped: bool,
}

impl DrainReport {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Durable FIFO of undelivered submissions.
#[derive(Debug)]
pub struct OfflineCache {
    path: PathBuf,
    entries: Mutex<Vec<CachedSubmission>>,
    draining: AtomicBool,
}

/// Clears the drain flag when the pass ends, including on panic.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl OfflineCache {
    /// Opens the cache at `path`. A missing file is an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => {
                let file: CacheFile = serde_json::from_str(&content).map_err(|e| {
                    ScrobblerError::cache_failed(
                        format!("Failed to parse cache file {}", path.display()),
                        e,
                    )
                })?;
                file.entries
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(ScrobblerError::cache_failed(
                    format!("Failed to read cache file {}", path.display()),
                    e,
                ))
            }
        };
        if !entries.is_empty() {
            info!("{} cached submissions waiting in {}", entries.len(), path.display());
        }
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            draining: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `entry` and persists the queue before returning.
    ///
    /// An entry whose id is already queued is ignored. If the file cannot be
    /// written the entry is still kept in memory and the error is returned.
    pub fn cache_submission(&self, entry: CachedSubmission) -> Result<()> {
        let mut entries = self.lock();
        if entries.iter().any(|e| e.id == entry.id) {
            debug!("Submission {} already cached", entry.id);
            return Ok(());
        }
        info!("Caching submission: {} - {}", entry.artist, entry.title);
        entries.push(entry);
        self.persist(&entries)
    }

    /// Replays every entry queued when the pass starts.
    ///
    /// The lock is not held while talking to the service, so new entries may be
    /// appended meanwhile; they are left for the next pass. Delivered and
    /// permanently rejected entries are removed by id.
    pub fn drain_and_retry(&self, service: &dyn ScrobbleService) -> DrainReport {
        if self
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Cache drain already in progress");
            return DrainReport::skipped();
        }
        let _guard = DrainGuard(&self.draining);

        let pending = self.lock().clone();
        if pending.is_empty() {
            return DrainReport::default();
        }
        info!("Replaying {} cached submissions", pending.len());

        let mut report = DrainReport::default();
        let mut finished = Vec::new();
        for entry in &pending {
            report.attempted += 1;
            let track = entry.identity();
            let result = if entry.as_scrobble {
                service.scrobble(&track, entry.captured_at)
            } else {
                service.announce_now_playing(&track)
            };
            match result {
                Ok(()) => {
                    report.delivered += 1;
                    finished.push(entry.id.clone());
                }
                Err(e) if e.code.is_retryable() => {
                    info!("Keeping cached submission {}: {}", track, e.message);
                    report.retained += 1;
                }
                Err(e) => {
                    if e.code == ErrorCode::InvalidParameters {
                        debug!("Dropping cached submission {}: {}", track, e);
                    } else {
                        error!("Dropping cached submission {}: {}", track, e);
                    }
                    report.discarded += 1;
                    finished.push(entry.id.clone());
                }
            }
        }

        if !finished.is_empty() {
            let mut entries = self.lock();
            entries.retain(|e| !finished.contains(&e.id));
            if let Err(e) = self.persist(&entries) {
                error!("{}", e);
            }
        }

        info!(
            "Cache replay: {} delivered, {} discarded, {} retained",
            report.delivered, report.discarded, report.retained
        );
        report
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the queued entries, oldest first.
    pub fn entries(&self) -> Vec<CachedSubmission> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CachedSubmission>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Offline cache lock was poisoned");
                poisoned.into_inner()
            }
        }
    }

    /// Writes the queue to disk. Called with the entries lock held.
    fn persist(&self, entries: &[CachedSubmission]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ScrobblerError::cache_failed(
                        format!("Failed to create cache directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = CacheFile {
            entries: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|e| {
            ScrobblerError::cache_failed("Failed to serialize cache".to_string(), e)
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| {
            ScrobblerError::cache_failed(format!("Failed to write {}", tmp.display()), e)
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ScrobblerError::cache_failed(format!("Failed to replace {}", self.path.display()), e)
        })
    }
}
