//! CLI command definitions and dispatch.

pub mod config;
pub mod convert;
pub mod discover;
pub mod list;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use stl2step_core::config::AppConfig;
use stl2step_core::error::AppError;

/// stl2step: batch STL to STEP conversion through FreeCAD
#[derive(Debug, Parser)]
#[command(name = "stl2step", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute (defaults to `convert`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert every mesh in the input directory
    Convert(convert::ConvertArgs),
    /// List the meshes a conversion run would pick up
    List(list::ListArgs),
    /// Show which freecadcmd would be used
    Discover(discover::DiscoverArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

/// Directory overrides shared by commands that touch the batch layout.
#[derive(Debug, Clone, Default, Args)]
pub struct PathArgs {
    /// Base directory the input/output directories are resolved against
    #[arg(long)]
    pub base_dir: Option<PathBuf>,

    /// Input directory (relative to the base directory unless absolute)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output directory (relative to the base directory unless absolute)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

impl PathArgs {
    /// Apply the overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(base) = &self.base_dir {
            config.paths.base_dir = Some(base.clone());
        }
        if let Some(input) = &self.input_dir {
            config.paths.input_dir = input.clone();
        }
        if let Some(output) = &self.output_dir {
            config.paths.output_dir = output.clone();
        }
    }
}

impl Cli {
    /// Execute the CLI command against an already loaded configuration
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            None => convert::execute(&convert::ConvertArgs::default(), config).await,
            Some(Commands::Convert(args)) => convert::execute(args, config).await,
            Some(Commands::List(args)) => list::execute(args, config).await,
            Some(Commands::Discover(args)) => discover::execute(args, config).await,
            Some(Commands::Config(args)) => {
                config::execute(args, self.config.as_deref(), config).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_no_arguments_defaults_to_convert() {
        let cli = Cli::try_parse_from(["stl2step"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_convert_flags() {
        let cli = Cli::try_parse_from([
            "stl2step",
            "convert",
            "--base-dir",
            "/srv/meshes",
            "--tolerance",
            "0.05",
            "--no-refine",
            "--keep-sources",
            "--timeout",
            "30",
            "--format",
            "json",
        ])
        .expect("parse");

        match cli.command {
            Some(Commands::Convert(args)) => {
                assert_eq!(args.paths.base_dir, Some(PathBuf::from("/srv/meshes")));
                assert_eq!(args.tolerance, Some(0.05));
                assert!(args.no_refine);
                assert!(args.keep_sources);
                assert_eq!(args.timeout, Some(30));
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["stl2step", "list", "--config", "conv.toml"])
            .expect("parse");
        assert_eq!(cli.config, Some(PathBuf::from("conv.toml")));
        assert!(matches!(cli.command, Some(Commands::List(_))));
    }

    #[test]
    fn test_config_generate_output() {
        let cli = Cli::try_parse_from(["stl2step", "config", "generate", "-o", "out.toml"])
            .expect("parse");
        match cli.command {
            Some(Commands::Config(args)) => match args.command {
                config::ConfigCommand::Generate { output } => {
                    assert_eq!(output, PathBuf::from("out.toml"))
                }
                other => panic!("unexpected subcommand: {:?}", other),
            },
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_path_overrides_apply() {
        let mut config = AppConfig::default();
        let paths = PathArgs {
            base_dir: Some(PathBuf::from("/base")),
            input_dir: None,
            output_dir: Some(PathBuf::from("solids")),
        };
        paths.apply(&mut config);
        assert_eq!(config.paths.base_dir, Some(PathBuf::from("/base")));
        assert_eq!(config.paths.input_dir, PathBuf::from("stl_files"));
        assert_eq!(config.paths.output_dir, PathBuf::from("solids"));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
