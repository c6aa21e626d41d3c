//! Gridrate CLI - Rate a word list for crossword suitability.

use clap::Parser;
use gridrate_cli::{exit_code, run, Cli};
use gridrate_evaluator::CancellationFlag;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Ctrl-C stops the run at the next batch or word boundary
    let cancel = CancellationFlag::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current record");
            watcher.cancel();
        }
    });

    let result = run(cli, cancel).await;
    if let Err(e) = &result {
        error!("{}", e);
        eprintln!("Error: {}", e);
    }
    std::process::exit(exit_code(&result));
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
