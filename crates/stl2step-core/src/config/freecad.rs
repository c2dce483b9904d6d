//! FreeCAD backend configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the `freecadcmd` headless interpreter.
///
/// If `executable` is empty the backend auto-discovers an installation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FreeCadConfig {
    /// Path to `freecadcmd` or to a FreeCAD install directory.
    #[serde(default)]
    pub executable: PathBuf,
    /// Timeout in seconds for converting a single file.
    #[serde(default = "default_timeout_seconds")]
    #[validate(range(min = 1, max = 7200))]
    pub timeout_seconds: u64,
    /// Whether to capture the interpreter's stdout/stderr for diagnostics.
    #[serde(default = "default_true")]
    pub capture_output: bool,
    /// Minimum output file size (bytes) to consider a conversion successful.
    #[serde(default = "default_min_output_bytes")]
    pub min_output_bytes: u64,
    /// Keep generated scripts after each run (debugging aid).
    #[serde(default)]
    pub keep_scripts: bool,
    /// Directory for generated scripts and status files.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for FreeCadConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::new(),
            timeout_seconds: default_timeout_seconds(),
            capture_output: true,
            min_output_bytes: default_min_output_bytes(),
            keep_scripts: false,
            scratch_dir: None,
        }
    }
}

fn default_timeout_seconds() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

fn default_min_output_bytes() -> u64 {
    1
}

impl FreeCadConfig {
    /// Resolve the effective scratch directory.
    pub fn effective_scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("stl2step"))
    }

    /// Whether an executable was configured explicitly.
    pub fn has_explicit_executable(&self) -> bool {
        !self.executable.as_os_str().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FreeCadConfig::default();
        assert!(!config.has_explicit_executable());
        assert_eq!(config.timeout_seconds, 600);
        assert!(config.capture_output);
        assert!(
            config
                .effective_scratch_dir()
                .ends_with(std::path::Path::new("stl2step"))
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = FreeCadConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
