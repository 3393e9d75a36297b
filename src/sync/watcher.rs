//! File system watcher feeding the sync engines.
//!
//! Provides cross-platform recursive watching using the notify crate and
//! groups raw notifications into ordered batches of typed changes.

use async_trait::async_trait;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc as async_mpsc;
use tokio::time::Instant;

use crate::error::{Result, WatchFsError};
use crate::sync::engine::is_partial_copy;
use crate::sync::filter::EventFilter;

/// Quiet period that closes a batch.
pub const BATCH_STEP: Duration = Duration::from_millis(50);

/// Upper bound on how long a batch keeps collecting once started.
pub const BATCH_DEBOUNCE: Duration = Duration::from_millis(1600);

/// Nature of a file system change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File or directory appeared.
    Added,
    /// File contents or metadata changed.
    Modified,
    /// File or directory disappeared.
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Deleted => "DELETED",
        };
        f.write_str(label)
    }
}

/// A single typed change under a watched root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn added(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Added, path)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Modified, path)
    }

    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::new(ChangeKind::Deleted, path)
    }

    /// Translate a raw notify event into zero or more typed changes.
    fn from_notify(event: Event) -> Vec<Self> {
        let mut paths = event.paths.into_iter();
        match event.kind {
            EventKind::Create(_) => paths.map(Self::added).collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.map(Self::deleted).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                paths.map(Self::added).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                let mut changes = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    changes.push(Self::deleted(from));
                }
                if let Some(to) = paths.next() {
                    changes.push(Self::added(to));
                }
                changes
            }
            EventKind::Modify(_) => paths.map(Self::modified).collect(),
            EventKind::Remove(_) => paths.map(Self::deleted).collect(),
            EventKind::Access(_) | EventKind::Other | EventKind::Any => Vec::new(),
        }
    }
}

/// A restartable stream of change batches.
#[async_trait]
pub trait ChangeSource: Send {
    /// Wait for the next non-empty batch. `None` once the stream has ended.
    async fn next_batch(&mut self) -> Option<Vec<ChangeEvent>>;
}

#[async_trait]
impl ChangeSource for async_mpsc::UnboundedReceiver<Vec<ChangeEvent>> {
    async fn next_batch(&mut self) -> Option<Vec<ChangeEvent>> {
        loop {
            let batch = self.recv().await?;
            if !batch.is_empty() {
                return Some(batch);
            }
        }
    }
}

/// Recursive watcher on one root producing filtered batches.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    receiver: async_mpsc::UnboundedReceiver<ChangeEvent>,
    root: PathBuf,
    filter: Option<Arc<dyn EventFilter>>,
}

impl FileWatcher {
    /// Start watching `root` recursively.
    pub fn new(root: &Path, filter: Option<Arc<dyn EventFilter>>) -> Result<Self> {
        let (tx, rx) = async_mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    for change in ChangeEvent::from_notify(event) {
                        let _ = tx.send(change);
                    }
                }
                Err(err) => tracing::error!(error = %err, "file watcher error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )
        .map_err(|source| WatchFsError::Watch {
            path: root.to_path_buf(),
            source,
        })?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatchFsError::Watch {
                path: root.to_path_buf(),
                source,
            })?;

        tracing::debug!(root = %root.display(), "watching");

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            root: root.to_path_buf(),
            filter,
        })
    }

    /// Watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }

}

/// Run the accept predicate over a collected batch on the blocking pool.
///
/// Filters may hash whole files, so they stay off the async workers.
async fn filter_batch(
    filter: Option<Arc<dyn EventFilter>>,
    events: Vec<ChangeEvent>,
) -> Vec<ChangeEvent> {
    let Some(filter) = filter else {
        return events;
    };
    let filtered = tokio::task::spawn_blocking(move || {
        events
            .into_iter()
            .filter(|change| filter.accept(change))
            .collect::<Vec<_>>()
    })
    .await;
    match filtered {
        Ok(events) => events,
        Err(err) => {
            tracing::error!(error = %err, "event filter failed, dropping batch");
            Vec::new()
        }
    }
}

#[async_trait]
impl ChangeSource for FileWatcher {
    async fn next_batch(&mut self) -> Option<Vec<ChangeEvent>> {
        loop {
            let first = self.receiver.recv().await?;
            let started = Instant::now();

            let mut batch = Batch::default();
            batch.push(first);

            loop {
                let deadline = (started + BATCH_DEBOUNCE).min(Instant::now() + BATCH_STEP);
                match tokio::time::timeout_at(deadline, self.receiver.recv()).await {
                    Ok(Some(change)) => batch.push(change),
                    // Channel closed: hand out what we have, the next call ends the stream
                    Ok(None) => break,
                    Err(_) => break,
                }
                if started.elapsed() >= BATCH_DEBOUNCE {
                    break;
                }
            }

            if batch.is_empty() {
                continue;
            }
            let events = filter_batch(self.filter.clone(), batch.into_events()).await;
            if !events.is_empty() {
                return Some(events);
            }
        }
    }
}

/// Ordered set of changes collected for one batch.
///
/// A repeated change moves to its latest position, so the batch replays the
/// final state of each `(kind, path)` in delivery order.
#[derive(Debug, Default)]
struct Batch {
    events: Vec<ChangeEvent>,
    seen: HashSet<ChangeEvent>,
}

impl Batch {
    fn push(&mut self, change: ChangeEvent) {
        if is_partial_copy(&change.path) {
            return;
        }
        if !self.seen.insert(change.clone()) {
            self.events.retain(|earlier| *earlier != change);
        }
        self.events.push(change);
    }

    fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn into_events(self) -> Vec<ChangeEvent> {
        self.events
    }
}
