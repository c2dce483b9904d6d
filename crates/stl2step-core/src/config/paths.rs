//! Input/output directory layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::result::AppResult;

/// Where meshes are read from and solids are written to.
///
/// Relative directories are resolved against `base_dir`, which defaults to
/// the directory holding the running executable.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PathsConfig {
    /// Base directory for relative paths. Empty means "next to the executable".
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Directory scanned for STL meshes.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,
    /// Directory receiving STEP files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("stl_files")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("step_files")
}

impl PathsConfig {
    /// Resolve the effective base directory.
    pub fn effective_base_dir(&self) -> AppResult<PathBuf> {
        if let Some(base) = self.base_dir.as_ref().filter(|b| !b.as_os_str().is_empty()) {
            return Ok(base.clone());
        }

        let exe = std::env::current_exe().map_err(|e| {
            AppError::with_source(
                crate::error::ErrorKind::Configuration,
                "Cannot determine executable location",
                e,
            )
        })?;

        exe.parent().map(Path::to_path_buf).ok_or_else(|| {
            AppError::configuration(format!(
                "Executable has no parent directory: {}",
                exe.display()
            ))
        })
    }

    /// Absolute (or base-relative) input directory.
    pub fn input_dir_in(&self, base: &Path) -> PathBuf {
        join_relative(base, &self.input_dir)
    }

    /// Absolute (or base-relative) output directory.
    pub fn output_dir_in(&self, base: &Path) -> PathBuf {
        join_relative(base, &self.output_dir)
    }
}

fn join_relative(base: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    }
}
