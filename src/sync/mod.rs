//! Sync & Replication Module
//!
//! Watches source roots and mirrors their changes into destination trees,
//! with optional exclusion and duplicate-change suppression.

pub mod cache;
pub mod engine;
pub mod filter;
pub mod hash;
pub mod mapping;
pub mod orchestrator;
pub mod watcher;

pub use cache::{ChangeCache, ChangeCacheFilter, CACHE_TTL};
pub use engine::{SyncAction, SyncEngine, SyncStats};
pub use filter::{CombinedFilter, EventFilter, ExcludeFilter, ExclusionRule};
pub use hash::{fingerprint_bytes, fingerprint_file, Fingerprint};
pub use mapping::{parse_mapping, resolve_mappings, ParsedMapping, SyncMapping};
pub use orchestrator::Orchestrator;
pub use watcher::{ChangeEvent, ChangeKind, ChangeSource, FileWatcher};
