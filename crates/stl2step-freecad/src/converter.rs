//! FreeCAD implementation of [`MeshConverter`].

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use stl2step_core::config::freecad::FreeCadConfig;
use stl2step_core::{AppResult, ConversionOutcome, ConversionRequest, MeshConverter};
use tracing::{debug, info, instrument, warn};

use crate::discovery::{FreeCadDiscovery, FreeCadInstallation};
use crate::error::FreeCadError;
use crate::executor::FreeCadExecutor;
use crate::scripting::ScriptingEngine;

/// Converts meshes by running `freecadcmd` once per file.
#[derive(Debug, Clone)]
pub struct FreeCadConverter {
    installation: FreeCadInstallation,
    executor: FreeCadExecutor,
    scratch_dir: PathBuf,
    min_output_bytes: u64,
    keep_scripts: bool,
}

impl FreeCadConverter {
    /// Build a converter from configuration, discovering FreeCAD if needed.
    pub fn from_config(config: &FreeCadConfig) -> Result<Self, FreeCadError> {
        let explicit = config
            .has_explicit_executable()
            .then_some(config.executable.as_path());
        let installation = FreeCadDiscovery::resolve(explicit)?;
        FreeCadDiscovery::validate(&installation)?;

        info!(installation = %installation.summary(), "Using FreeCAD");

        Ok(Self::new(installation, config))
    }

    /// Build a converter for an already resolved installation.
    pub fn new(installation: FreeCadInstallation, config: &FreeCadConfig) -> Self {
        let executor = FreeCadExecutor::new(
            installation.executable_path.clone(),
            Duration::from_secs(config.timeout_seconds),
            config.capture_output,
        );
        Self {
            installation,
            executor,
            scratch_dir: config.effective_scratch_dir(),
            min_output_bytes: config.min_output_bytes,
            keep_scripts: config.keep_scripts,
        }
    }

    /// The installation in use.
    pub fn installation(&self) -> &FreeCadInstallation {
        &self.installation
    }

    async fn run_conversion(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionOutcome, FreeCadError> {
        let start = Instant::now();

        if let Some(parent) = request.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let files = ScriptingEngine::write_script(request, &self.scratch_dir).await?;

        let result = async {
            self.executor
                .run(&files.script_path, &self.scratch_dir)
                .await?;
            ScriptingEngine::read_status(&files.status_path)
                .await?
                .into_result()
        }
        .await;

        if self.keep_scripts {
            debug!(script = %files.script_path.display(), "Keeping generated script");
        } else {
            files.remove().await;
        }

        let strategy = result?;
        let output_bytes = self.validate_output(&request.output_path).await?;

        Ok(ConversionOutcome {
            output_path: request.output_path.clone(),
            output_bytes,
            strategy,
            duration: start.elapsed(),
        })
    }

    /// Check that the output exists and meets the minimum size.
    async fn validate_output(&self, output_path: &Path) -> Result<u64, FreeCadError> {
        let metadata = match tokio::fs::metadata(output_path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FreeCadError::OutputNotCreated {
                    path: output_path.to_path_buf(),
                });
            }
            Err(e) => return Err(FreeCadError::Io(e)),
        };

        if metadata.len() < self.min_output_bytes {
            return Err(FreeCadError::OutputTooSmall {
                path: output_path.to_path_buf(),
                size: metadata.len(),
            });
        }

        Ok(metadata.len())
    }

    /// Remove whatever the interpreter left at the output path.
    async fn discard_partial_output(output_path: &Path) {
        match tokio::fs::remove_file(output_path).await {
            Ok(()) => debug!(path = %output_path.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %output_path.display(),
                error = %e,
                "Failed to remove partial output"
            ),
        }
    }
}

#[async_trait]
impl MeshConverter for FreeCadConverter {
    fn backend_name(&self) -> &str {
        "freecad"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(FreeCadDiscovery::validate(&self.installation).is_ok())
    }

    #[instrument(skip(self, request), fields(input = %request.input_path.display()))]
    async fn convert(&self, request: &ConversionRequest) -> AppResult<ConversionOutcome> {
        let output_existed = tokio::fs::try_exists(&request.output_path)
            .await
            .unwrap_or(false);

        match self.run_conversion(request).await {
            Ok(outcome) => {
                info!(
                    output = %outcome.output_path.display(),
                    bytes = outcome.output_bytes,
                    strategy = ?outcome.strategy,
                    elapsed_ms = outcome.duration.as_millis() as u64,
                    "Mesh converted"
                );
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "FreeCAD conversion failed");
                if !output_existed {
                    Self::discard_partial_output(&request.output_path).await;
                }
                Err(e.into())
            }
        }
    }
}
