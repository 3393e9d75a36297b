//! Top-level run loop: resolve, announce, watch until interrupted.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::WatchConfig;
use crate::error::Result;
use crate::sync::Orchestrator;
use crate::ui;

/// Resolve the configuration and mirror until `cancel` fires.
///
/// Every mapping and the filter pipeline are validated before anything is
/// watched.
pub async fn run(config: WatchConfig, cancel: CancellationToken) -> Result<()> {
    let mappings = config.resolve_mappings()?;
    let filter = config.build_filter()?;

    ui::print_banner(&mappings);

    let results = Orchestrator::new(mappings, Arc::new(filter))
        .run(cancel.clone())
        .await?;

    let errors: usize = results.iter().map(|(_, stats)| stats.errors).sum();
    if errors > 0 {
        tracing::warn!(errors, "some changes could not be mirrored");
    }

    if cancel.is_cancelled() {
        ui::print_farewell();
    }
    Ok(())
}

/// Cancel `cancel` on the first Ctrl+C.
pub fn cancel_on_interrupt(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => cancel.cancel(),
            Err(err) => tracing::error!(error = %err, "failed to listen for Ctrl+C"),
        }
    })
}
