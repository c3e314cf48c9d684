//! procplot - samples a process's resource usage and charts it on Ctrl-C.

use anyhow::Result;
use clap::Parser;
use procplot::{
    app::{termination_signal, App},
    cli::Cli,
    config::Config,
    coordinator::TerminationReason,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        init_tracing("error");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });
    init_tracing(&config.log_level);

    info!("procplot starting up...");

    let app = App::builder(config).build()?;
    let termination = app.run(termination_signal()).await.map_err(|err| {
        error!("Export failed: {:#}", err);
        err
    })?;

    match (termination.reason, &termination.report) {
        (TerminationReason::ProcessExited, _) => info!(
            records = termination.records,
            "Monitored process exited. Exiting."
        ),
        (TerminationReason::Signal, Some(path)) => info!(
            records = termination.records,
            path = %path.display(),
            "Report written. Exiting."
        ),
        (TerminationReason::Signal, None) => {
            info!(records = termination.records, "Interrupted. Exiting.")
        }
    }

    Ok(())
}
