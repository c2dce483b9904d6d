//! Per-batch result records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stl2step_core::SolidStrategy;

use crate::metrics::MetricsSnapshot;

/// What happened to one discovered input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Converted {
        output_bytes: u64,
        strategy: SolidStrategy,
        duration_ms: u64,
    },
    Failed {
        error: String,
    },
}

/// Outcome record for one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub input_name: String,
    pub output_name: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Converted { .. })
    }
}

/// A converted source that could not be deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalFailure {
    pub input_name: String,
    pub error: String,
}

/// Summary of a completed batch run.
///
/// `outcomes` holds one entry per discovered file, in processing order,
/// so `successful() + failed() == discovered`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub discovered: usize,
    pub outcomes: Vec<FileOutcome>,
    /// Sources deleted after conversion.
    pub removed: Vec<String>,
    pub removal_failures: Vec<RemovalFailure>,
    pub metrics: MetricsSnapshot,
}

impl BatchReport {
    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }

    /// Number of files the loop processed.
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Input names that converted, in processing order.
    pub fn converted_inputs(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.input_name.as_str())
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
