//! Filesystem layout of a batch: directory setup, discovery, naming and
//! source removal.

use std::path::{Path, PathBuf};

use stl2step_core::config::AppConfig;
use stl2step_core::{AppError, AppResult};
use tracing::{debug, warn};

/// Input/output directories and the extensions linking them.
#[derive(Debug, Clone)]
pub struct BatchLayout {
    input_dir: PathBuf,
    output_dir: PathBuf,
    input_extension: String,
    output_extension: String,
}

impl BatchLayout {
    /// Create a layout. Extensions are given without a leading dot.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        input_extension: &str,
        output_extension: &str,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            input_extension: input_extension.trim_start_matches('.').to_string(),
            output_extension: output_extension.trim_start_matches('.').to_string(),
        }
    }

    /// Build the layout described by the configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let base = config.paths.effective_base_dir()?;
        Ok(Self::new(
            config.paths.input_dir_in(&base),
            config.paths.output_dir_in(&base),
            &config.conversion.input_extension,
            &config.conversion.output_extension,
        ))
    }

    /// Directory scanned for meshes.
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory receiving solids.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extension of discovered inputs, without the dot.
    pub fn input_extension(&self) -> &str {
        &self.input_extension
    }

    /// Ensure both directories exist. Idempotent.
    pub async fn setup_directories(&self) -> AppResult<()> {
        for dir in [&self.input_dir, &self.output_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::with_source(
                    stl2step_core::ErrorKind::Storage,
                    format!("Cannot create directory {}: {}", dir.display(), e),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// List matching regular files in the input directory, sorted by name.
    ///
    /// A missing input directory yields an empty list.
    pub async fn discover_inputs(&self) -> AppResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.input_dir).await {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !self.matches_extension(&path) {
                continue;
            }

            // Follows symlinks; a link to a mesh counts as a mesh
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                debug!(path = %path.display(), "Skipping non-file entry");
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => files.push(name),
                Err(raw) => warn!(name = ?raw, "Skipping file with non-UTF-8 name"),
            }
        }

        files.sort();
        Ok(files)
    }

    /// Whether `path` carries the input extension (ASCII case-insensitive).
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.input_extension))
    }

    /// Full path of a discovered input.
    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.input_dir.join(file_name)
    }

    /// Output file name: the input's base name with the output extension.
    pub fn output_name(&self, file_name: &str) -> String {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        format!("{}.{}", stem, self.output_extension)
    }

    /// Full output path for a discovered input.
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(self.output_name(file_name))
    }

    /// Size of an input file, if readable.
    pub async fn input_size(&self, file_name: &str) -> Option<u64> {
        tokio::fs::metadata(self.input_path(file_name))
            .await
            .ok()
            .map(|m| m.len())
    }

    /// Delete a converted source file.
    pub async fn remove_source(&self, file_name: &str) -> std::io::Result<()> {
        tokio::fs::remove_file(self.input_path(file_name)).await
    }
}
