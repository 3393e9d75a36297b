//! Runs one engine per mapping concurrently, all sharing one filter pipeline.

use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::sync::engine::{SyncEngine, SyncStats};
use crate::sync::filter::EventFilter;
use crate::sync::mapping::SyncMapping;
use crate::sync::watcher::{ChangeSource, FileWatcher};

/// Owns the resolved mappings and the shared filter.
pub struct Orchestrator {
    mappings: Vec<SyncMapping>,
    filter: Arc<dyn EventFilter>,
    report: bool,
}

impl Orchestrator {
    pub fn new(mappings: Vec<SyncMapping>, filter: Arc<dyn EventFilter>) -> Self {
        Self {
            mappings,
            filter,
            report: true,
        }
    }

    /// Toggle the per-event line on stdout for every engine.
    pub fn with_reporting(mut self, report: bool) -> Self {
        self.report = report;
        self
    }

    pub fn mappings(&self) -> &[SyncMapping] {
        &self.mappings
    }

    /// Watch every source root and mirror until `cancel` fires.
    ///
    /// All watchers are started before any engine runs; a root that cannot be
    /// watched aborts the whole run.
    pub async fn run(self, cancel: CancellationToken) -> Result<Vec<(SyncMapping, SyncStats)>> {
        let sources = self
            .mappings
            .iter()
            .map(|mapping| FileWatcher::new(mapping.source(), Some(Arc::clone(&self.filter))))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.run_with_sources(sources, cancel).await)
    }

    /// Drive each mapping from the matching source, in order.
    ///
    /// The shared filter is applied by the sources themselves; `FileWatcher`
    /// receives it in [`Orchestrator::run`].
    pub async fn run_with_sources<S>(
        self,
        sources: Vec<S>,
        cancel: CancellationToken,
    ) -> Vec<(SyncMapping, SyncStats)>
    where
        S: ChangeSource + 'static,
    {
        let mut tasks = JoinSet::new();
        for (mapping, source) in self.mappings.into_iter().zip(sources) {
            let engine = SyncEngine::new(mapping.clone()).with_reporting(self.report);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let stats = engine.run(source, cancel).await;
                (mapping, stats)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((mapping, stats)) => {
                    tracing::info!(
                        mapping = %mapping,
                        events = stats.events,
                        copied = stats.files_copied,
                        deleted = stats.files_deleted,
                        errors = stats.errors,
                        "mapping stopped"
                    );
                    results.push((mapping, stats));
                }
                Err(err) => tracing::error!(error = %err, "sync task failed"),
            }
        }
        results
    }
}
