//! Progress callbacks for a running batch.
//!
//! The processor emits one event per step; the binary prints them, tests
//! record them.

use std::path::Path;

use stl2step_core::{AppError, ConversionOutcome};

use crate::report::BatchReport;

/// Receives batch progress events in order.
///
/// All methods default to no-ops so implementors only handle what they
/// display.
pub trait BatchReporter: Send + Sync {
    /// Discovery finished. `files` may be empty.
    fn discovered(&self, _input_dir: &Path, _files: &[String]) {}

    /// A file is about to be converted.
    fn converting(&self, _input_name: &str) {}

    fn converted(&self, _input_name: &str, _output_name: &str, _outcome: &ConversionOutcome) {}

    fn conversion_failed(&self, _input_name: &str, _error: &AppError) {}

    /// A converted source was deleted.
    fn removed(&self, _input_name: &str) {}

    fn removal_failed(&self, _input_name: &str, _error: &std::io::Error) {}

    /// The batch completed. Not called for empty batches.
    fn finished(&self, _report: &BatchReport) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl BatchReporter for NullReporter {}
