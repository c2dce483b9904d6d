//! Report which FreeCAD interpreter would be used.

use std::path::PathBuf;

use clap::Args;

use stl2step_core::config::AppConfig;
use stl2step_core::error::AppError;
use stl2step_freecad::{FreeCadDiscovery, FreeCadError};

use crate::output::{self, OutputFormat};

/// Arguments for the discover command
#[derive(Debug, Clone, Default, Args)]
pub struct DiscoverArgs {
    /// Path to freecadcmd or a FreeCAD installation directory
    #[arg(long)]
    pub freecad: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Execute the discover command
pub async fn execute(args: &DiscoverArgs, config: AppConfig) -> Result<(), AppError> {
    let configured = config
        .freecad
        .has_explicit_executable()
        .then_some(config.freecad.executable.as_path());
    let explicit = args.freecad.as_deref().or(configured);

    let installation = match FreeCadDiscovery::resolve(explicit) {
        Ok(found) => found,
        Err(e) => {
            output::print_error(&format!("FreeCAD not found: {}", e));
            output::print_warning(&format!(
                "Install FreeCAD or point --freecad at one of: {}",
                FreeCadDiscovery::launcher_names().join(", ")
            ));
            return Err(FreeCadError::from(e).into());
        }
    };

    let usable = FreeCadDiscovery::validate(&installation);

    match args.format {
        OutputFormat::Json => output::print_json(&installation),
        OutputFormat::Text => {
            output::print_success(&installation.summary());
            output::print_kv("Executable", &installation.executable_path.display().to_string());
            output::print_kv("Install directory", &installation.install_dir.display().to_string());
            if let Some(version) = &installation.display_version {
                output::print_kv("Version", version);
            }
            output::print_kv(
                "Timeout",
                &format!("{}s per file", config.freecad.timeout_seconds),
            );
            if let Err(e) = &usable {
                output::print_warning(&e.to_string());
            }
        }
    }

    usable.map_err(|e| FreeCadError::from(e).into())
}
