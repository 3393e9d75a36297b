//! Runtime configuration assembled from the command line.

use crate::cli::Cli;
use crate::error::Result;
use crate::sync::{resolve_mappings, ChangeCacheFilter, CombinedFilter, ExcludeFilter, SyncMapping};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "WATCHFS_LOG";

/// Default log filter when [`LOG_ENV`] is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Everything the watcher needs to start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchConfig {
    /// Raw mapping arguments, in command-line order.
    pub mappings: Vec<String>,
    /// Raw comma-separated exclusion list.
    pub exclude: Option<String>,
    /// Whether the content cache stage is enabled.
    pub content_caching: bool,
}

impl From<Cli> for WatchConfig {
    fn from(cli: Cli) -> Self {
        Self {
            mappings: cli.sync_mapping,
            exclude: cli.exclude,
            content_caching: cli.enable_content_caching,
        }
    }
}

impl WatchConfig {
    /// Resolve every mapping, failing on the first invalid one.
    pub fn resolve_mappings(&self) -> Result<Vec<SyncMapping>> {
        resolve_mappings(&self.mappings)
    }

    /// Assemble the filter pipeline: exclusion first, then the content cache.
    pub fn build_filter(&self) -> Result<CombinedFilter> {
        let mut filter = CombinedFilter::default();
        if let Some(exclude) = self.exclude.as_deref().filter(|arg| !arg.is_empty()) {
            filter.push(Box::new(ExcludeFilter::from_cli_arg(exclude)?));
        }
        if self.content_caching {
            filter.push(Box::new(ChangeCacheFilter::new()));
        }
        Ok(filter)
    }
}
