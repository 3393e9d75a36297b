// Shared fixtures for sync integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

use watchfs::sync::{parse_mapping, SyncEngine, SyncMapping};

/// Temp workspace with `src` and `dst` roots and a validated mapping between them.
pub struct Workspace {
    _dir: TempDir,
    pub root: PathBuf,
    pub src: PathBuf,
    pub dst: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let src = root.join("src");
        let dst = root.join("dst");
        fs::create_dir(&src).unwrap();
        fs::create_dir(&dst).unwrap();
        Self {
            _dir: dir,
            root,
            src,
            dst,
        }
    }

    pub fn mapping(&self) -> SyncMapping {
        let raw = format!("{}:{}", self.src.display(), self.dst.display());
        parse_mapping(&raw).unwrap().into_mappings().remove(0)
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(self.mapping()).with_reporting(false)
    }
}

/// Poll `check` until it holds or `timeout` passes.
pub fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    check()
}

pub fn read(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}
