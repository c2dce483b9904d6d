//! Application configuration schemas.
//!
//! The configuration is deserialized from an optional file and
//! `STL2STEP__`-prefixed environment variables via the `config` crate.
//! The file is always parsed as TOML, whatever its extension. Every field
//! has a default, so running without any file is valid.

pub mod conversion;
pub mod freecad;
pub mod logging;
pub mod paths;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::conversion::ConversionConfig;
use self::freecad::FreeCadConfig;
use self::logging::LoggingConfig;
use self::paths::PathsConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STL2STEP";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Input/output directory layout.
    #[serde(default)]
    #[validate(nested)]
    pub paths: PathsConfig,
    /// Per-batch conversion parameters.
    #[serde(default)]
    #[validate(nested)]
    pub conversion: ConversionConfig,
    /// FreeCAD backend settings.
    #[serde(default)]
    #[validate(nested)]
    pub freecad: FreeCadConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from an optional TOML file plus environment.
    ///
    /// When `path` is given the file must exist. Environment variables such
    /// as `STL2STEP__CONVERSION__TOLERANCE=0.05` override file values.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(AppError::configuration(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: AppConfig = config.try_deserialize()?;

        app.ensure_valid()?;
        Ok(app)
    }

    /// Re-check value ranges, e.g. after command-line overrides.
    pub fn ensure_valid(&self) -> AppResult<()> {
        self.validate()?;
        Ok(())
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
