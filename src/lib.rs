pub mod cli;
pub mod config;
pub mod db;
pub mod generators;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod resolver;

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    // Logs go to stderr so JSON on stdout stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match cli::execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Run failed");
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
