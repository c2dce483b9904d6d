//! `freecadcmd` process execution.
//!
//! Runs one generated script per invocation with timeout management and
//! optional output capturing.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::FreeCadError;

/// Maximum number of stderr characters kept in error values.
const MAX_STDERR_CHARS: usize = 2000;

/// Captured result of a finished interpreter run.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Standard output (empty when not captured).
    pub stdout: String,
    /// Standard error (empty when not captured).
    pub stderr: String,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

/// Spawns `freecadcmd` for generated scripts.
#[derive(Debug, Clone)]
pub struct FreeCadExecutor {
    executable: PathBuf,
    timeout: Duration,
    capture_output: bool,
}

impl FreeCadExecutor {
    /// Create an executor for the given interpreter.
    pub fn new(executable: PathBuf, timeout: Duration, capture_output: bool) -> Self {
        Self {
            executable,
            timeout,
            capture_output,
        }
    }

    /// Path of the interpreter.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Per-run timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `script_path` to completion, killing the interpreter on timeout.
    pub async fn run(
        &self,
        script_path: &Path,
        working_dir: &Path,
    ) -> Result<ProcessOutput, FreeCadError> {
        if !self.executable.exists() {
            return Err(FreeCadError::ExecutableNotFound {
                path: self.executable.clone(),
            });
        }

        let mut cmd = Command::new(&self.executable);

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let (stdout_cfg, stderr_cfg) = if self.capture_output {
            (Stdio::piped(), Stdio::piped())
        } else {
            (Stdio::null(), Stdio::null())
        };

        cmd.arg(script_path)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(stdout_cfg)
            .stderr(stderr_cfg)
            .kill_on_drop(true);

        debug!(
            freecad = %self.executable.display(),
            script = %script_path.display(),
            timeout_ms = self.timeout.as_millis() as u64,
            "Spawning freecadcmd"
        );

        let start = Instant::now();

        // Dropping the output future on timeout drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                error!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    script = %script_path.display(),
                    "freecadcmd timed out, killing"
                );
                return Err(FreeCadError::Timeout { timeout: self.timeout });
            }
        };

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !stderr.is_empty() {
            debug!(stderr = %stderr, "freecadcmd stderr output");
        }

        if output.status.success() {
            info!(
                elapsed_ms = duration.as_millis() as u64,
                "freecadcmd run completed"
            );
            return Ok(ProcessOutput {
                stdout,
                stderr,
                duration,
            });
        }

        match output.status.code() {
            Some(code) => {
                error!(
                    code = code,
                    elapsed_ms = duration.as_millis() as u64,
                    stderr = %stderr,
                    "freecadcmd failed"
                );
                Err(FreeCadError::ProcessFailed {
                    code,
                    stderr: stderr.chars().take(MAX_STDERR_CHARS).collect(),
                    stdout,
                })
            }
            None => Err(FreeCadError::ProcessKilled),
        }
    }
}
