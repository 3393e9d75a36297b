use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use watchfs::app;
use watchfs::cli::Cli;
use watchfs::config::{WatchConfig, DEFAULT_LOG_FILTER, LOG_ENV};
use watchfs::{Result, WatchFsError};

fn main() {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    init_tracing();

    if let Err(err) = run(cli.into()) {
        eprintln!("{}: {}", "error".red().bold(), err);
        std::process::exit(err.exit_code());
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(config: WatchConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| WatchFsError::io("starting the async runtime", e))?;

    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let _interrupt = app::cancel_on_interrupt(cancel.clone());
        app::run(config, cancel).await
    })
}
