//! Python script generation for `freecadcmd`.
//!
//! Each conversion runs one generated script. The script reports its
//! result through a small JSON status file instead of the exit code,
//! since `freecadcmd` exits 0 even when the script raises.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use stl2step_core::{ConversionRequest, SolidStrategy};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::error::FreeCadError;

/// Script template; `@NAME@` placeholders are substituted at render time.
const SCRIPT_TEMPLATE: &str = r#"# Generated by stl2step; executed by freecadcmd.
import json

INPUT_PATH = @INPUT_PATH@
OUTPUT_PATH = @OUTPUT_PATH@
STATUS_PATH = @STATUS_PATH@
TOLERANCE = @TOLERANCE@
REFINE = @REFINE@


def write_status(payload):
    with open(STATUS_PATH, "w") as handle:
        json.dump(payload, handle)


def convert():
    import FreeCAD
    import Mesh
    import Part

    doc = FreeCAD.newDocument("Conversion")
    try:
        Mesh.insert(INPUT_PATH, doc.Name)
        if not doc.Objects:
            raise RuntimeError("mesh import produced no objects")
        mesh = doc.Objects[0].Mesh
        shape = Part.Shape()
        shape.makeShapeFromMesh(mesh.Topology, TOLERANCE)
        if REFINE:
            shape = shape.removeSplitter()
        if shape.isValid():
            solid = Part.Solid(shape)
            strategy = "direct"
        else:
            solid = Part.makeSolid(shape)
            strategy = "make_solid"
        solid.exportStep(OUTPUT_PATH)
        return strategy
    finally:
        FreeCAD.closeDocument(doc.Name)


try:
    write_status({"ok": True, "strategy": convert()})
except Exception as exc:
    write_status({"ok": False, "error": str(exc) or type(exc).__name__})
"#;

/// Paths of the files generated for one conversion.
#[derive(Debug, Clone)]
pub struct ScriptFiles {
    /// The Python script handed to `freecadcmd`.
    pub script_path: PathBuf,
    /// Where the script writes its JSON status.
    pub status_path: PathBuf,
}

impl ScriptFiles {
    /// Best-effort removal of the script and its status file.
    pub async fn remove(&self) {
        for path in [&self.script_path, &self.status_path] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "Failed to remove script file");
                }
            }
        }
    }
}

/// Status document written by the script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStatus {
    /// Whether the conversion completed.
    pub ok: bool,
    /// Solid construction path, present on success.
    #[serde(default)]
    pub strategy: Option<SolidStrategy>,
    /// Exception message, present on failure.
    #[serde(default)]
    pub error: Option<String>,
}

impl ScriptStatus {
    /// Turn the status into the strategy used, or the script's error.
    pub fn into_result(self) -> Result<SolidStrategy, FreeCadError> {
        if self.ok {
            Ok(self.strategy.unwrap_or(SolidStrategy::Direct))
        } else {
            Err(FreeCadError::ScriptFailed {
                message: self
                    .error
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "unknown FreeCAD error".to_string()),
            })
        }
    }
}

/// Generates and reads back `freecadcmd` scripts.
pub struct ScriptingEngine;

impl ScriptingEngine {
    /// Write the script for `request` into `scratch_dir`.
    pub async fn write_script(
        request: &ConversionRequest,
        scratch_dir: &Path,
    ) -> Result<ScriptFiles, FreeCadError> {
        tokio::fs::create_dir_all(scratch_dir).await?;

        let stem = Self::sanitize_stem(&request.input_path);
        let unique = Uuid::now_v7().simple();
        let files = ScriptFiles {
            script_path: scratch_dir.join(format!("convert__{}__{}.py", stem, unique)),
            status_path: scratch_dir.join(format!("convert__{}__{}.status.json", stem, unique)),
        };

        let content = Self::render(request, &files.status_path)?;

        let mut file = tokio::fs::File::create(&files.script_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        Ok(files)
    }

    /// Render the script text.
    pub fn render(request: &ConversionRequest, status_path: &Path) -> Result<String, FreeCadError> {
        Ok(SCRIPT_TEMPLATE
            .replace("@INPUT_PATH@", &Self::python_string(&request.input_path)?)
            .replace("@OUTPUT_PATH@", &Self::python_string(&request.output_path)?)
            .replace("@STATUS_PATH@", &Self::python_string(status_path)?)
            .replace("@TOLERANCE@", &format!("{:?}", request.tolerance))
            .replace("@REFINE@", if request.refine { "True" } else { "False" }))
    }

    /// Read the status file left by a finished script.
    pub async fn read_status(status_path: &Path) -> Result<ScriptStatus, FreeCadError> {
        let raw = match tokio::fs::read(status_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FreeCadError::MissingStatus {
                    path: status_path.to_path_buf(),
                });
            }
            Err(e) => return Err(FreeCadError::Io(e)),
        };
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Quote a path as a Python string literal.
    ///
    /// JSON string escapes are a subset of Python's, so a JSON-encoded
    /// string is a valid literal.
    fn python_string(path: &Path) -> Result<String, FreeCadError> {
        let s = path.to_str().ok_or_else(|| FreeCadError::InvalidUtf8Path {
            path: path.to_path_buf(),
        })?;
        Ok(serde_json::to_string(s)?)
    }

    /// Filesystem-safe stem used in generated file names.
    fn sanitize_stem(path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let sanitized: String = stem
            .chars()
            .filter_map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                    Some(c)
                } else if c.is_whitespace() || c == '.' {
                    Some('_')
                } else {
                    None
                }
            })
            .take(64)
            .collect();

        if sanitized.is_empty() {
            "mesh".to_string()
        } else {
            sanitized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(input: &str, output: &str) -> ConversionRequest {
        ConversionRequest {
            input_path: PathBuf::from(input),
            output_path: PathBuf::from(output),
            tolerance: 0.1,
            refine: true,
        }
    }

    #[test]
    fn test_render_embeds_paths_and_parameters() {
        let req = request("/data/stl_files/cube.stl", "/data/step_files/cube.step");
        let script =
            ScriptingEngine::render(&req, Path::new("/tmp/cube.status.json")).expect("render");

        assert!(script.contains(r#"INPUT_PATH = "/data/stl_files/cube.stl""#));
        assert!(script.contains(r#"OUTPUT_PATH = "/data/step_files/cube.step""#));
        assert!(script.contains(r#"STATUS_PATH = "/tmp/cube.status.json""#));
        assert!(script.contains("TOLERANCE = 0.1\n"));
        assert!(script.contains("REFINE = True\n"));
        assert!(script.contains("makeShapeFromMesh(mesh.Topology, TOLERANCE)"));
        assert!(script.contains("Part.makeSolid(shape)"));
        assert!(script.contains("exportStep(OUTPUT_PATH)"));
        assert!(!script.contains('@'));
    }

    #[test]
    fn test_render_escapes_quotes_and_backslashes() {
        let req = request(r#"C:\meshes\my "part".stl"#, r"C:\out\part.step");
        let script = ScriptingEngine::render(&req, Path::new("status.json")).expect("render");
        assert!(script.contains(r#"INPUT_PATH = "C:\\meshes\\my \"part\".stl""#));
        assert!(script.contains(r#"OUTPUT_PATH = "C:\\out\\part.step""#));
    }

    #[test]
    fn test_render_without_refine() {
        let mut req = request("/a.stl", "/a.step");
        req.refine = false;
        req.tolerance = 1.0;
        let script = ScriptingEngine::render(&req, Path::new("/s.json")).expect("render");
        assert!(script.contains("REFINE = False\n"));
        assert!(script.contains("TOLERANCE = 1.0\n"));
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(
            ScriptingEngine::sanitize_stem(Path::new("/x/my part.v2.stl")),
            "my_part_v2"
        );
        assert_eq!(ScriptingEngine::sanitize_stem(Path::new("/x/***.stl")), "mesh");
    }

    #[test]
    fn test_status_success_and_failure() {
        let ok: ScriptStatus =
            serde_json::from_str(r#"{"ok": true, "strategy": "make_solid"}"#).expect("parse");
        assert_eq!(ok.into_result().expect("ok"), SolidStrategy::MakeSolid);

        let failed: ScriptStatus =
            serde_json::from_str(r#"{"ok": false, "error": "Mesh is not closed"}"#)
                .expect("parse");
        match failed.into_result() {
            Err(FreeCadError::ScriptFailed { message }) => {
                assert_eq!(message, "Mesh is not closed")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_script_and_missing_status() {
        let temp = tempfile::tempdir().expect("tempdir");
        let req = request("/data/cube.stl", "/data/cube.step");

        let files = ScriptingEngine::write_script(&req, temp.path())
            .await
            .expect("write");
        assert!(files.script_path.exists());
        assert!(
            files
                .script_path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("convert__cube__"))
        );

        let missing = ScriptingEngine::read_status(&files.status_path).await;
        assert!(matches!(missing, Err(FreeCadError::MissingStatus { .. })));

        files.remove().await;
        assert!(!files.script_path.exists());
    }
}
