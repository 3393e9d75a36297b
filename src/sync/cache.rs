//! Short-lived content cache that suppresses duplicate change notifications.
//!
//! Editors and build tools often emit several notifications for one logical
//! save. The cache remembers the fingerprint last seen for each path and
//! drops additions or modifications whose content has not changed since.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::sync::filter::EventFilter;
use crate::sync::hash::{fingerprint_file, Fingerprint};
use crate::sync::watcher::{ChangeEvent, ChangeKind};

/// How long an entry stays eligible for duplicate suppression.
pub const CACHE_TTL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    observed_at: Instant,
    fingerprint: Fingerprint,
}

/// Path-keyed fingerprint cache shared by every engine.
#[derive(Debug)]
pub struct ChangeCache {
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
    ttl: Duration,
}

impl Default for ChangeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record `fingerprint` for `path`.
    ///
    /// Returns `true` when the same fingerprint was already live for the path,
    /// i.e. the notification is a duplicate. Sweep, lookup and update happen
    /// under a single lock acquisition.
    pub fn observe(&self, path: &Path, fingerprint: Fingerprint) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        self.sweep_locked(&mut entries, now);

        match entries.get(path) {
            Some(entry) if entry.fingerprint == fingerprint => true,
            _ => {
                entries.insert(
                    path.to_path_buf(),
                    CacheEntry {
                        observed_at: now,
                        fingerprint,
                    },
                );
                false
            }
        }
    }

    /// Drop every entry older than the TTL.
    pub fn sweep(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.sweep_locked(&mut entries, Instant::now());
    }

    fn sweep_locked(&self, entries: &mut HashMap<PathBuf, CacheEntry>, now: Instant) {
        entries.retain(|_, entry| now.duration_since(entry.observed_at) <= self.ttl);
    }

    /// Number of live or not-yet-swept entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Filter stage backed by a [`ChangeCache`].
#[derive(Debug, Default)]
pub struct ChangeCacheFilter {
    cache: ChangeCache,
}

impl ChangeCacheFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(cache: ChangeCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &ChangeCache {
        &self.cache
    }
}

impl EventFilter for ChangeCacheFilter {
    fn accept(&self, event: &ChangeEvent) -> bool {
        self.cache.sweep();
        match event.kind {
            // Deletions are never deduplicated and leave the entry in place
            ChangeKind::Deleted => true,
            ChangeKind::Added | ChangeKind::Modified => {
                if event.path.is_dir() {
                    return true;
                }
                match fingerprint_file(&event.path) {
                    Ok(fingerprint) => {
                        let duplicate = self.cache.observe(&event.path, fingerprint);
                        if duplicate {
                            tracing::trace!(path = %event.path.display(), "suppressed duplicate change");
                        }
                        !duplicate
                    }
                    Err(err) => {
                        // Vanished or unreadable; let the engine decide
                        tracing::debug!(path = %event.path.display(), error = %err, "could not fingerprint");
                        true
                    }
                }
            }
        }
    }
}
