//! Parsing and validation of `SRC:DST` style sync mappings.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchFsError};
use crate::path_utils::{is_strict_ancestor, resolve_path};

/// A directional pairing of a watched source root and its mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMapping {
    source: PathBuf,
    destination: PathBuf,
}

impl SyncMapping {
    /// Build without validation; callers outside this module go through
    /// [`parse_mapping`].
    pub(crate) fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Mirror location of a path under the source root, or `None` if the
    /// path lies outside it.
    pub fn mirror_path(&self, path: &Path) -> Option<PathBuf> {
        let relative = path.strip_prefix(&self.source).ok()?;
        if relative.as_os_str().is_empty() {
            Some(self.destination.clone())
        } else {
            Some(self.destination.join(relative))
        }
    }
}

impl fmt::Display for SyncMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source.display(), self.destination.display())
    }
}

/// Result of parsing one raw mapping argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMapping {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub bidirectional: bool,
}

impl ParsedMapping {
    /// Expand into one-way mappings; bidirectional ones yield both directions.
    pub fn into_mappings(self) -> Vec<SyncMapping> {
        let forward = SyncMapping {
            source: self.source,
            destination: self.destination,
        };
        if self.bidirectional {
            let backward = SyncMapping {
                source: forward.destination.clone(),
                destination: forward.source.clone(),
            };
            vec![forward, backward]
        } else {
            vec![forward]
        }
    }
}

/// Parse a raw mapping such as `src:dst`, `src->dst` or `src<->dst`.
///
/// `:` takes precedence over the arrow forms. Both sides are resolved to
/// absolute canonical paths and a source that contains its destination is
/// rejected.
pub fn parse_mapping(raw: &str) -> Result<ParsedMapping> {
    let (segments, bidirectional): (Vec<&str>, bool) = if raw.contains(':') {
        (raw.split(':').collect(), false)
    } else if raw.contains("<->") {
        (raw.split("<->").collect(), true)
    } else if raw.contains("->") {
        (raw.split("->").collect(), false)
    } else {
        (vec![raw], false)
    };

    let (src, dst) = match segments.as_slice() {
        [src, dst] if !src.is_empty() && !dst.is_empty() => (*src, *dst),
        _ => {
            return Err(WatchFsError::parse(format!(
                "Invalid sync mapping '{}'. Expected SRC:DST, SRC->DST or SRC<->DST.",
                raw
            )))
        }
    };

    let source = resolve_path(Path::new(src))
        .map_err(|e| WatchFsError::io(format!("resolving {}", src), e))?;
    let destination = resolve_path(Path::new(dst))
        .map_err(|e| WatchFsError::io(format!("resolving {}", dst), e))?;

    if is_strict_ancestor(&source, &destination) || source == destination {
        return Err(WatchFsError::parse(format!(
            "src_dir({}) is a parent directory of dst_dir({}).",
            source.display(),
            destination.display()
        )));
    }

    Ok(ParsedMapping {
        source,
        destination,
        bidirectional,
    })
}

/// Parse every raw mapping, failing on the first invalid one.
pub fn resolve_mappings<S: AsRef<str>>(raws: &[S]) -> Result<Vec<SyncMapping>> {
    let mut mappings = Vec::new();
    for raw in raws {
        mappings.extend(parse_mapping(raw.as_ref())?.into_mappings());
    }
    Ok(mappings)
}
