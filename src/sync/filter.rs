//! Event filters applied to every notification before it reaches an engine.
//!
//! Filters share one capability, [`EventFilter::accept`], and compose through
//! [`CombinedFilter`], which only lets an event through when every stage
//! accepts it.

use globset::{GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchFsError};
use crate::path_utils::{absolutize, resolve_path};
use crate::sync::watcher::ChangeEvent;

/// Accept/reject decision for a single change.
pub trait EventFilter: Send + Sync {
    fn accept(&self, event: &ChangeEvent) -> bool;
}

/// Logical AND over an ordered list of filters.
#[derive(Default)]
pub struct CombinedFilter {
    filters: Vec<Box<dyn EventFilter>>,
}

impl CombinedFilter {
    pub fn new(filters: Vec<Box<dyn EventFilter>>) -> Self {
        Self { filters }
    }

    /// Append a stage; stages run in insertion order.
    pub fn push(&mut self, filter: Box<dyn EventFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl EventFilter for CombinedFilter {
    fn accept(&self, event: &ChangeEvent) -> bool {
        self.filters.iter().all(|filter| filter.accept(event))
    }
}

/// One configured exclusion.
#[derive(Debug, Clone)]
pub enum ExclusionRule {
    /// Matches the directory itself and everything below it.
    Directory(PathBuf),
    /// Shell-style wildcard against the whole absolute path.
    Glob { pattern: String, matcher: GlobMatcher },
    /// Matches one path exactly.
    Exact(PathBuf),
}

impl ExclusionRule {
    /// Classify a single raw pattern.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains('*') {
            let absolute = absolutize(Path::new(raw))
                .map_err(|e| WatchFsError::io("resolving exclude pattern", e))?;
            let pattern = absolute.to_string_lossy().into_owned();
            // `*` stays within one path component, like a shell
            let matcher = GlobBuilder::new(&pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    WatchFsError::parse(format!("Invalid exclude pattern '{}': {}", raw, e))
                })?
                .compile_matcher();
            return Ok(Self::Glob { pattern, matcher });
        }

        let resolved = resolve_path(Path::new(raw))
            .map_err(|e| WatchFsError::io("resolving exclude path", e))?;
        if resolved.is_dir() {
            Ok(Self::Directory(resolved))
        } else {
            Ok(Self::Exact(resolved))
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            Self::Directory(dir) => path.starts_with(dir),
            Self::Glob { matcher, .. } => matcher.is_match(path),
            Self::Exact(exact) => path == exact,
        }
    }
}

/// Rejects events whose path matches any configured exclusion rule.
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    rules: Vec<ExclusionRule>,
}

impl ExcludeFilter {
    /// Build from the comma-separated `--exclude` argument.
    pub fn from_cli_arg(arg: &str) -> Result<Self> {
        let rules = arg
            .split(',')
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(ExclusionRule::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn from_rules(rules: Vec<ExclusionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ExclusionRule] {
        &self.rules
    }

    /// Check if a path is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.rules.iter().any(|rule| rule.matches(path))
    }
}

impl EventFilter for ExcludeFilter {
    fn accept(&self, event: &ChangeEvent) -> bool {
        !self.is_excluded(&event.path)
    }
}
