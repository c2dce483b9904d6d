//! # stl2step-batch
//!
//! The sequential batch driver. Enumerates meshes in the input directory,
//! hands each to a [`MeshConverter`](stl2step_core::MeshConverter), records
//! the outcome, deletes converted sources and produces a [`BatchReport`].
//!
//! A failure converting one file never stops the batch.

pub mod filesystem;
pub mod metrics;
pub mod processor;
pub mod report;
pub mod reporter;

pub use filesystem::BatchLayout;
pub use metrics::{ConversionMetrics, MetricsSnapshot};
pub use processor::{BatchOptions, BatchProcessor};
pub use report::{BatchReport, FileOutcome, FileStatus, RemovalFailure};
pub use reporter::{BatchReporter, NullReporter};
