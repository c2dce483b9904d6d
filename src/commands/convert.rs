//! The batch conversion command.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::info;

use stl2step_batch::{BatchLayout, BatchOptions, BatchProcessor, NullReporter};
use stl2step_core::config::AppConfig;
use stl2step_core::error::AppError;
use stl2step_freecad::FreeCadConverter;

use super::PathArgs;
use crate::output::{self, ConsoleReporter, OutputFormat};

/// Arguments for the convert command
#[derive(Debug, Clone, Default, Args)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Shape reconstruction tolerance
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Skip removing redundant splitter faces
    #[arg(long)]
    pub no_refine: bool,

    /// Keep source meshes after a successful conversion
    #[arg(long)]
    pub keep_sources: bool,

    /// Path to freecadcmd or a FreeCAD installation directory
    #[arg(long)]
    pub freecad: Option<PathBuf>,

    /// Per-file timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl ConvertArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), AppError> {
        self.paths.apply(config);

        if let Some(tolerance) = self.tolerance {
            config.conversion.tolerance = tolerance;
        }
        if self.no_refine {
            config.conversion.refine = false;
        }
        if self.keep_sources {
            config.conversion.delete_sources = false;
        }
        if let Some(freecad) = &self.freecad {
            config.freecad.executable = freecad.clone();
        }
        if let Some(timeout) = self.timeout {
            config.freecad.timeout_seconds = timeout;
        }

        config.ensure_valid()
    }
}

/// Execute the convert command
pub async fn execute(args: &ConvertArgs, mut config: AppConfig) -> Result<(), AppError> {
    args.apply(&mut config)?;

    let converter = FreeCadConverter::from_config(&config.freecad)?;
    let layout = BatchLayout::from_config(&config)?;

    info!(
        input_dir = %layout.input_dir().display(),
        output_dir = %layout.output_dir().display(),
        tolerance = config.conversion.tolerance,
        "Starting batch"
    );

    let processor = BatchProcessor::new(
        layout,
        Arc::new(converter),
        BatchOptions::from_config(&config),
    );

    match args.format {
        OutputFormat::Text => {
            output::print_banner();
            processor.run(&ConsoleReporter::new()).await?;
        }
        OutputFormat::Json => {
            let report = processor.run(&NullReporter).await?;
            output::print_json(&report);
        }
    }

    Ok(())
}
