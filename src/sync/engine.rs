//! Sync engine applying change events to a mirror tree.
//!
//! One engine runs per mapping. It holds no state between events: each
//! accepted change is translated into copies, directory creations and
//! removals under the destination root.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::sync::hash::fingerprint_file;
use crate::sync::mapping::SyncMapping;
use crate::sync::watcher::{ChangeEvent, ChangeKind, ChangeSource};
use crate::ui;

const PARTIAL_PREFIX: &str = ".watchfs-";
const PARTIAL_SUFFIX: &str = ".part";

/// Whether `path` is one of the engine's in-flight copy files.
pub fn is_partial_copy(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with(PARTIAL_PREFIX) && name.ends_with(PARTIAL_SUFFIX))
}

/// An action performed on the mirror tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// File content written to destination.
    Copied { from: PathBuf, to: PathBuf },
    /// Destination already held identical content.
    Unchanged { path: PathBuf },
    /// Directory created in destination.
    CreatedDir { path: PathBuf },
    /// File or link removed from destination.
    Removed { path: PathBuf },
    /// Empty directory removed from destination.
    RemovedDir { path: PathBuf },
}

impl SyncAction {
    /// Destination path the action touched.
    pub fn path(&self) -> &Path {
        match self {
            Self::Copied { to, .. } => to,
            Self::Unchanged { path }
            | Self::CreatedDir { path }
            | Self::Removed { path }
            | Self::RemovedDir { path } => path,
        }
    }
}

/// Counters accumulated over an engine's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Events handed to the engine.
    pub events: usize,
    /// Files copied.
    pub files_copied: usize,
    /// Copies skipped because content already matched.
    pub files_unchanged: usize,
    /// Files deleted.
    pub files_deleted: usize,
    /// Directories created.
    pub dirs_created: usize,
    /// Directories deleted.
    pub dirs_deleted: usize,
    /// Events whose application failed.
    pub errors: usize,
}

impl SyncStats {
    fn record(&mut self, actions: &[SyncAction]) {
        for action in actions {
            match action {
                SyncAction::Copied { .. } => self.files_copied += 1,
                SyncAction::Unchanged { .. } => self.files_unchanged += 1,
                SyncAction::CreatedDir { .. } => self.dirs_created += 1,
                SyncAction::Removed { .. } => self.files_deleted += 1,
                SyncAction::RemovedDir { .. } => self.dirs_deleted += 1,
            }
        }
    }

    pub fn merge(&mut self, other: &SyncStats) {
        self.events += other.events;
        self.files_copied += other.files_copied;
        self.files_unchanged += other.files_unchanged;
        self.files_deleted += other.files_deleted;
        self.dirs_created += other.dirs_created;
        self.dirs_deleted += other.dirs_deleted;
        self.errors += other.errors;
    }
}

/// Applies change events from one source root to its destination root.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    mapping: Arc<SyncMapping>,
    report: bool,
}

impl SyncEngine {
    /// Create a new sync engine.
    pub fn new(mapping: SyncMapping) -> Self {
        Self {
            mapping: Arc::new(mapping),
            report: true,
        }
    }

    /// Toggle the per-event line on stdout.
    pub fn with_reporting(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    pub fn mapping(&self) -> &SyncMapping {
        &self.mapping
    }

    /// Consume batches until the source ends or `cancel` fires.
    ///
    /// A batch that has started is always applied to completion.
    pub async fn run<S: ChangeSource>(&self, mut source: S, cancel: CancellationToken) -> SyncStats {
        let mut stats = SyncStats::default();

        loop {
            let batch = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                batch = source.next_batch() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };

            let engine = self.clone();
            match tokio::task::spawn_blocking(move || engine.apply_batch(&batch)).await {
                Ok(batch_stats) => stats.merge(&batch_stats),
                Err(err) => {
                    tracing::error!(mapping = %self.mapping, error = %err, "batch worker failed");
                    stats.errors += 1;
                }
            }
        }

        tracing::debug!(mapping = %self.mapping, ?stats, "engine stopped");
        stats
    }

    /// Apply a batch in order. Failures are logged per event and do not stop
    /// the remaining events.
    pub fn apply_batch(&self, batch: &[ChangeEvent]) -> SyncStats {
        let mut stats = SyncStats::default();
        for event in batch {
            stats.events += 1;
            if self.report {
                ui::print_change(event);
            }
            match self.apply(event) {
                Ok(actions) => stats.record(&actions),
                Err(err) => {
                    tracing::warn!(
                        mapping = %self.mapping,
                        path = %event.path.display(),
                        error = %format!("{:#}", err),
                        "failed to mirror change"
                    );
                    stats.errors += 1;
                }
            }
        }
        stats
    }

    /// Apply one event, returning the actions performed in order.
    pub fn apply(&self, event: &ChangeEvent) -> Result<Vec<SyncAction>> {
        let mut actions = Vec::new();
        match event.kind {
            ChangeKind::Added | ChangeKind::Modified => self.mirror(&event.path, &mut actions)?,
            ChangeKind::Deleted => self.remove_mirrored(&event.path, &mut actions)?,
        }
        for action in &actions {
            tracing::debug!(mapping = %self.mapping, ?action, "applied");
        }
        Ok(actions)
    }

    fn destination_for(&self, path: &Path) -> Result<PathBuf> {
        self.mapping.mirror_path(path).with_context(|| {
            format!(
                "{} is outside source root {}",
                path.display(),
                self.mapping.source().display()
            )
        })
    }

    /// Ensure `path` and everything below it is mirrored.
    fn mirror(&self, path: &Path, actions: &mut Vec<SyncAction>) -> Result<()> {
        if path.is_file() {
            let dest = self.destination_for(path)?;
            return self.copy_file(path, &dest, actions);
        }
        if !path.is_dir() {
            return Ok(());
        }

        let mut to_scan = vec![path.to_path_buf()];
        while let Some(current) = to_scan.pop() {
            let dest = self.destination_for(&current)?;
            if !dest.is_dir() {
                fs::create_dir_all(&dest)
                    .with_context(|| format!("Failed to create directory: {}", dest.display()))?;
                actions.push(SyncAction::CreatedDir { path: dest });
            }

            let entries = match fs::read_dir(&current) {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to read directory: {}", current.display()))
                }
            };

            let mut files = Vec::new();
            for entry in entries {
                let entry = entry?;
                let child = entry.path();
                if is_partial_copy(&child) {
                    continue;
                }
                // Only descend into real directories; linked files are copied by content
                if entry.file_type()?.is_dir() {
                    to_scan.push(child);
                } else if child.is_file() {
                    files.push(child);
                }
            }
            files.sort();
            for file in files {
                let dest = self.destination_for(&file)?;
                self.copy_file(&file, &dest, actions)?;
            }
        }

        Ok(())
    }

    /// Copy `src` over `dst` through a temp file in the destination directory.
    fn copy_file(&self, src: &Path, dst: &Path, actions: &mut Vec<SyncAction>) -> Result<()> {
        let parent = dst
            .parent()
            .with_context(|| format!("{} has no parent directory", dst.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;

        if dst.is_file() && same_content(src, dst)? {
            actions.push(SyncAction::Unchanged {
                path: dst.to_path_buf(),
            });
            return Ok(());
        }

        let mut reader = fs::File::open(src)
            .with_context(|| format!("Failed to open {}", src.display()))?;
        let mut partial = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        io::copy(&mut reader, partial.as_file_mut())
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dst.display()))?;
        partial
            .persist(dst)
            .with_context(|| format!("Failed to move copy into place at {}", dst.display()))?;

        actions.push(SyncAction::Copied {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
        });
        Ok(())
    }

    /// Remove the mirror of `path`, children before their directory.
    fn remove_mirrored(&self, path: &Path, actions: &mut Vec<SyncAction>) -> Result<()> {
        let target = self.destination_for(path)?;
        let metadata = match fs::symlink_metadata(&target) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to stat {}", target.display()))
            }
        };

        if !metadata.is_dir() {
            remove_file(&target, actions)?;
            return Ok(());
        }

        // (directory, children already queued)
        let mut stack = vec![(target, false)];
        while let Some((dir, expanded)) = stack.pop() {
            if expanded {
                match fs::remove_dir(&dir) {
                    Ok(()) => actions.push(SyncAction::RemovedDir { path: dir }),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => {
                        return Err(err)
                            .with_context(|| format!("Failed to remove directory: {}", dir.display()))
                    }
                }
                continue;
            }

            stack.push((dir.clone(), true));
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Failed to read directory: {}", dir.display()))
                }
            };
            for entry in entries {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    stack.push((entry.path(), false));
                } else {
                    remove_file(&entry.path(), actions)?;
                }
            }
        }

        Ok(())
    }
}

fn remove_file(path: &Path, actions: &mut Vec<SyncAction>) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            actions.push(SyncAction::Removed {
                path: path.to_path_buf(),
            });
            Ok(())
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

fn same_content(a: &Path, b: &Path) -> Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(fingerprint_file(a)? == fingerprint_file(b)?)
}
