// Path normalization for mapping roots, exclusion rules and event paths
// Every comparison in the crate happens between paths produced here

use std::io;
use std::path::{Component, Path, PathBuf};

/// Make a path absolute against the current directory without touching the filesystem
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(clean_path(path))
    } else {
        Ok(clean_path(&std::env::current_dir()?.join(path)))
    }
}

/// Resolve a path to absolute canonical form, even when it does not exist yet.
///
/// The longest existing prefix is canonicalized (resolving symlinks) and the
/// remaining components are appended lexically.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = absolutize(path)?;

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                let mut resolved = canonical;
                for component in missing.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                // Nothing on the way up exists; fall back to the lexical form
                _ => return Ok(absolute),
            },
        }
    }
}

/// Whether `ancestor` is a strict ancestor of `path` (component-wise)
pub fn is_strict_ancestor(ancestor: &Path, path: &Path) -> bool {
    ancestor != path && path.starts_with(ancestor)
}

/// Clean a path by removing redundant components like "." and ".."
/// This provides a normalized form without requiring the path to exist
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // ".." at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    let result: PathBuf = components.iter().collect();
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}
