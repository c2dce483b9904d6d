//! Batch orchestration: setup, discovery, sequential conversion, source
//! cleanup and reporting.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use stl2step_core::config::AppConfig;
use stl2step_core::{AppResult, ConversionRequest, MeshConverter};
use tracing::{debug, error, info, instrument, warn};

use crate::filesystem::BatchLayout;
use crate::metrics::ConversionMetrics;
use crate::report::{BatchReport, FileOutcome, FileStatus, RemovalFailure};
use crate::reporter::BatchReporter;

/// Per-batch conversion settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub tolerance: f64,
    pub refine: bool,
    /// Delete sources that converted successfully.
    pub delete_sources: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.1,
            refine: true,
            delete_sources: true,
        }
    }
}

impl BatchOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tolerance: config.conversion.tolerance,
            refine: config.conversion.refine,
            delete_sources: config.conversion.delete_sources,
        }
    }
}

/// Drives one batch run over a [`BatchLayout`].
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    layout: BatchLayout,
    converter: Arc<dyn MeshConverter>,
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(layout: BatchLayout, converter: Arc<dyn MeshConverter>, options: BatchOptions) -> Self {
        Self {
            layout,
            converter,
            options,
        }
    }

    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    /// Run the batch to completion.
    ///
    /// Only directory setup and discovery errors are returned; a failed
    /// file is recorded in the report and the loop moves on. Counters
    /// start from zero on every run.
    #[instrument(skip(self, reporter), fields(backend = self.converter.backend_name()))]
    pub async fn run(&self, reporter: &dyn BatchReporter) -> AppResult<BatchReport> {
        let started_at = Utc::now();
        let metrics = ConversionMetrics::new();

        self.layout.setup_directories().await?;
        let files = self.layout.discover_inputs().await?;

        info!(
            input_dir = %self.layout.input_dir().display(),
            count = files.len(),
            "Discovered input meshes"
        );
        reporter.discovered(self.layout.input_dir(), &files);

        let mut outcomes = Vec::with_capacity(files.len());
        for name in &files {
            outcomes.push(self.convert_one(name, &metrics, reporter).await);
        }

        let mut removed = Vec::new();
        let mut removal_failures = Vec::new();

        if self.options.delete_sources {
            let converted = outcomes
                .iter()
                .filter(|o| o.is_success())
                .map(|o| o.input_name.as_str());

            for name in converted {
                match self.layout.remove_source(name).await {
                    Ok(()) => {
                        debug!(file = name, "Removed converted source");
                        metrics.record_removal(true);
                        reporter.removed(name);
                        removed.push(name.to_string());
                    }
                    Err(e) => {
                        warn!(file = name, error = %e, "Could not remove converted source");
                        metrics.record_removal(false);
                        reporter.removal_failed(name, &e);
                        removal_failures.push(RemovalFailure {
                            input_name: name.to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        let report = BatchReport {
            started_at,
            finished_at: Utc::now(),
            input_dir: self.layout.input_dir().to_path_buf(),
            output_dir: self.layout.output_dir().to_path_buf(),
            discovered: files.len(),
            outcomes,
            removed,
            removal_failures,
            metrics: metrics.snapshot(),
        };

        if report.discovered > 0 {
            info!(
                successful = report.successful(),
                failed = report.failed(),
                removed = report.removed.len(),
                elapsed_ms = report.elapsed_ms(),
                "Batch complete"
            );
            reporter.finished(&report);
        }

        Ok(report)
    }

    /// Convert a single discovered file. Never fails; errors become a
    /// [`FileStatus::Failed`] outcome.
    async fn convert_one(
        &self,
        name: &str,
        metrics: &ConversionMetrics,
        reporter: &dyn BatchReporter,
    ) -> FileOutcome {
        let output_name = self.layout.output_name(name);
        let request = ConversionRequest {
            input_path: self.layout.input_path(name),
            output_path: self.layout.output_path(name),
            tolerance: self.options.tolerance,
            refine: self.options.refine,
        };

        reporter.converting(name);
        metrics.record_attempt(self.layout.input_size(name).await);

        let output_existed = tokio::fs::try_exists(&request.output_path)
            .await
            .unwrap_or(false);

        let status = match self.converter.convert(&request).await {
            Ok(outcome) => {
                metrics.record_success(outcome.duration, outcome.output_bytes);
                reporter.converted(name, &output_name, &outcome);
                FileStatus::Converted {
                    output_bytes: outcome.output_bytes,
                    strategy: outcome.strategy,
                    duration_ms: outcome.duration.as_millis() as u64,
                }
            }
            Err(e) => {
                error!(file = name, kind = %e.kind, error = %e.message, "Conversion failed");
                metrics.record_failure(e.is_timeout());
                if !output_existed {
                    discard_output(&request.output_path).await;
                }
                reporter.conversion_failed(name, &e);
                FileStatus::Failed { error: e.message }
            }
        };

        FileOutcome {
            input_name: name.to_string(),
            output_name,
            status,
        }
    }
}

/// Remove anything a failed backend left at a fresh output path.
async fn discard_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => warn!(path = %path.display(), "Removed output left by failed conversion"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Could not remove failed output"),
    }
}
