//! stl2step: batch STL to STEP converter
//!
//! Loads configuration, sets up logging and dispatches the CLI command.
//! Without a subcommand the binary converts every mesh in the input
//! directory next to the executable.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use stl2step_core::config::AppConfig;
use stl2step_core::config::logging::{LogFormat, LoggingConfig};

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        "stl2step starting"
    );

    if let Err(e) = cli.execute(config).await {
        tracing::error!(kind = %e.kind, "{}", e.message);
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

/// Initialize tracing/logging. Logs go to stderr; stdout carries the report.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Compact => {
            fmt()
                .compact()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
