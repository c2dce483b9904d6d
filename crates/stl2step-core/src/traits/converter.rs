//! Mesh-to-solid converter trait.
//!
//! The batch driver only knows this narrow capability: hand a mesh path
//! and a target path to a backend, get a solid file or an error back.
//! The FreeCAD implementation lives in `stl2step-freecad`; tests use
//! in-memory fakes.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// One mesh-to-solid conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Path to the source mesh.
    pub input_path: PathBuf,
    /// Path the solid should be written to.
    pub output_path: PathBuf,
    /// Shape reconstruction tolerance.
    pub tolerance: f64,
    /// Whether redundant splitters are removed before building the solid.
    pub refine: bool,
}

/// How the backend turned the reconstructed shape into a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolidStrategy {
    /// The shape was valid and wrapped as a solid directly.
    Direct,
    /// The shape was invalid; the alternate solid routine rebuilt it.
    MakeSolid,
}

/// Successful conversion details reported by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Path of the written solid file.
    pub output_path: PathBuf,
    /// Size of the written file in bytes.
    pub output_bytes: u64,
    /// Solid construction path taken.
    pub strategy: SolidStrategy,
    /// Wall-clock time spent in the backend.
    pub duration: Duration,
}

/// A backend able to convert a triangle mesh into a solid-body file.
#[async_trait]
pub trait MeshConverter: Send + Sync + std::fmt::Debug + 'static {
    /// Return the backend name (e.g., "freecad").
    fn backend_name(&self) -> &str;

    /// Check whether the backend is usable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Convert one mesh. Errors are per-file and never abort a batch.
    async fn convert(&self, request: &ConversionRequest) -> AppResult<ConversionOutcome>;
}
