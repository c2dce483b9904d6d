//! Show the meshes waiting in the input directory.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use stl2step_batch::BatchLayout;
use stl2step_core::config::AppConfig;
use stl2step_core::error::AppError;

use super::PathArgs;
use crate::output::{self, OutputFormat};

/// Arguments for the list command
#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub paths: PathArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Pending mesh display row
#[derive(Debug, Serialize, Tabled)]
struct PendingRow {
    /// Input file name
    #[tabled(rename = "Mesh")]
    name: String,
    /// Input size
    #[tabled(rename = "Size")]
    size: String,
    /// File the conversion would write
    #[tabled(rename = "Target")]
    target: String,
    /// Whether the target already exists and would be overwritten
    #[tabled(rename = "Overwrites")]
    overwrites: bool,
}

/// Execute the list command. Does not create directories.
pub async fn execute(args: &ListArgs, mut config: AppConfig) -> Result<(), AppError> {
    args.paths.apply(&mut config);
    let layout = BatchLayout::from_config(&config)?;

    let mut rows = Vec::new();
    for name in layout.discover_inputs().await? {
        let size = layout
            .input_size(&name)
            .await
            .map(output::human_bytes)
            .unwrap_or_else(|| "?".to_string());
        let overwrites = tokio::fs::try_exists(layout.output_path(&name))
            .await
            .unwrap_or(false);

        rows.push(PendingRow {
            target: layout.output_name(&name),
            name,
            size,
            overwrites,
        });
    }

    let empty = format!("No STL files found in: {}", layout.input_dir().display());
    output::print_list(&rows, args.format, &empty);
    Ok(())
}
