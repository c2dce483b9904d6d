//! Per-batch conversion parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Parameters applied to every file in a batch.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConversionConfig {
    /// Maximum deviation between the reconstructed shape and the mesh.
    #[serde(default = "default_tolerance")]
    #[validate(range(exclusive_min = 0.0, max = 100.0))]
    pub tolerance: f64,
    /// Merge coplanar faces (remove splitters) before building the solid.
    #[serde(default = "default_true")]
    pub refine: bool,
    /// Delete source meshes that converted successfully.
    #[serde(default = "default_true")]
    pub delete_sources: bool,
    /// Extension (without dot) of files picked up from the input directory.
    #[serde(default = "default_input_extension")]
    #[validate(length(min = 1, max = 16))]
    pub input_extension: String,
    /// Extension (without dot) given to produced files.
    #[serde(default = "default_output_extension")]
    #[validate(length(min = 1, max = 16))]
    pub output_extension: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            refine: true,
            delete_sources: true,
            input_extension: default_input_extension(),
            output_extension: default_output_extension(),
        }
    }
}

fn default_tolerance() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_input_extension() -> String {
    "stl".to_string()
}

fn default_output_extension() -> String {
    "step".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = ConversionConfig {
            tolerance: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_extension_rejected() {
        let config = ConversionConfig {
            input_extension: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
