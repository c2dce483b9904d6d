//! Configuration management CLI commands.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use stl2step_core::config::AppConfig;
use stl2step_core::error::AppError;

use crate::output;

/// Commented default configuration shipped with the binary.
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (file + environment) as JSON
    Show,
    /// Validate the configuration and print the resolved directories
    Validate,
    /// Write the default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "stl2step.toml")]
        output: PathBuf,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: Option<&Path>,
    config: AppConfig,
) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            println!("{}", config.to_json_pretty()?);
        }
        ConfigCommand::Validate => {
            let source = config_path
                .map(|p| format!("'{}'", p.display()))
                .unwrap_or_else(|| "built-in defaults".to_string());

            let base = config.paths.effective_base_dir()?;
            output::print_success(&format!("Configuration from {} is valid", source));
            output::print_kv(
                "Input directory",
                &config.paths.input_dir_in(&base).display().to_string(),
            );
            output::print_kv(
                "Output directory",
                &config.paths.output_dir_in(&base).display().to_string(),
            );
            output::print_kv("Tolerance", &config.conversion.tolerance.to_string());
            output::print_kv(
                "FreeCAD",
                if config.freecad.has_explicit_executable() {
                    config.freecad.executable.to_str().unwrap_or("(non-UTF-8 path)")
                } else {
                    "auto-discover"
                },
            );
        }
        ConfigCommand::Generate { output: out_path } => {
            write_default(out_path).await?;
            output::print_success(&format!(
                "Default config written to '{}'",
                out_path.display()
            ));
        }
    }

    Ok(())
}

/// Write [`DEFAULT_CONFIG`] to `path`, creating parent directories.
async fn write_default(path: &Path) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::storage(format!("Failed to create dir: {}", e)))?;
    }

    tokio::fs::write(path, DEFAULT_CONFIG)
        .await
        .map_err(|e| AppError::storage(format!("Failed to write config: {}", e)))
}
